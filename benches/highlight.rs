use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use lexique::observe::NoopObserver;
use lexique::{TermEntry, TermStore, find_matching_term, highlight_spans};

const PARAGRAPH: &str = "Pour déverrouiller l'écran, faites un glissement vers le haut, \
puis appuyez sur l'icône des paramètres. Si le Wi-Fi est coupé, glisser le curseur \
vers la droite et confirmer la notification qui s'affiche en haut de l'écran.";

fn synthetic_store(size: usize) -> TermStore {
    let mut entries: Vec<TermEntry> = vec![
        term("Glisser", &["glisse", "glissement"]),
        term("Appuyer", &["appui"]),
        term("Écran", &[]),
        term("Paramètre", &["paramètres"]),
        term("Wi-Fi", &[]),
        term("Notification", &[]),
    ];
    for index in entries.len()..size {
        entries.push(term(&format!("Terme{index}"), &[]));
    }
    entries.truncate(size.max(1));
    TermStore::new(entries)
}

fn term(name: &str, variants: &[&str]) -> TermEntry {
    TermEntry {
        id: name.to_lowercase(),
        term: name.to_string(),
        definition: format!("Définition de {name}."),
        example: None,
        category: None,
        related_terms: Vec::new(),
        variants: variants.iter().map(|v| v.to_string()).collect(),
        is_active: true,
    }
}

fn bench_span_scan(c: &mut Criterion) {
    for size in [6usize, 50, 200] {
        let store = synthetic_store(size);
        c.bench_with_input(BenchmarkId::new("span_scan", size), &store, |b, store| {
            b.iter(|| {
                let spans = highlight_spans(PARAGRAPH, store, &NoopObserver);
                black_box(spans.len());
            });
        });
    }
}

fn bench_word_resolution(c: &mut Criterion) {
    let store = synthetic_store(200);
    const WORDS: &[&str] = &["glissement", "paramètres", "écran", "introuvable"];
    for &word in WORDS {
        c.bench_with_input(BenchmarkId::new("resolve_word", word), &word, |b, &word| {
            b.iter(|| {
                let matched = find_matching_term(word, &store);
                black_box(matched.map(|entry| entry.term.as_str()));
            });
        });
    }
}

criterion_group!(benches, bench_span_scan, bench_word_resolution);
criterion_main!(benches);
