use find_simpairs::{LshConfig, LshSearcher, MemorySource, Shingler, SimilaritySearcher};

fn main() {
    let documents = vec![
        (1, "Welcome to Jimbocho, the town of books and curry!"),
        (2, "Welcome to Jimbocho, the city of books and curry!"),
        (3, "We welcome you to Jimbocho, the town of books and curry."),
        (4, "Welcome to the town of books and curry, Jimbocho!"),
    ];

    // Shingles character trigrams into ids in [0, 2^16) (with seed value 42).
    let shingler = Shingler::new(3, 1 << 16, 42).unwrap();
    let mut source = MemorySource::from_texts(&shingler, documents);

    // Builds signatures of 100 hashes split into 25 bands of 4 rows.
    let searcher = LshSearcher::new(LshConfig::new(100, 25).seed(42))
        .unwrap()
        .in_parallel(true)
        .build_signatures(&mut source)
        .unwrap();

    // Searches all pairs more similar than 0.5.
    let pairs = searcher.similar_pairs_above(0.5).unwrap();
    for pair in find_simpairs::sort_pairs(pairs, find_simpairs::SortOrder::Descending) {
        println!("{pair}");
    }
}
