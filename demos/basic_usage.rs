//! Basic usage of `lsh_knn`.
//!
//! Demonstrates the builder pattern, bulk insertion of random vectors,
//! k-NN queries, fixed-size padded output, stats and metrics, and an index
//! over custom objects with closure-defined hash functions.
//!
//! Run with:
//!   cargo run --example basic_usage

use lsh_knn::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

const DIM: usize = 128;
const NUM_VECTORS: usize = 10_000;

fn main() {
    // ---------------------------------------------------------------
    // 1. Build a vector index using the builder pattern.
    // ---------------------------------------------------------------
    println!("=== Step 1: Build the index ===");
    let mut index = VectorLshIndex::builder()
        .dim(DIM)
        .num_hashes(8)
        .num_tables(16)
        .distance_metric(DistanceMetric::Cosine)
        .seed(42)
        .enable_metrics()
        .build()
        .expect("failed to build index");

    println!(
        "Created index: dim={}, hashes=8, tables=16, metric=Cosine, seed=42, metrics=on\n",
        index.dim()
    );

    // ---------------------------------------------------------------
    // 2. Generate and insert 10,000 random 128-d vectors.
    // ---------------------------------------------------------------
    println!("=== Step 2: Insert {} random vectors ===", NUM_VECTORS);

    let mut rng = StdRng::seed_from_u64(123);
    let normal = Normal::new(0.0_f32, 1.0).unwrap();

    let vectors: Vec<Vec<f32>> = (0..NUM_VECTORS)
        .map(|_| (0..DIM).map(|_| normal.sample(&mut rng)).collect())
        .collect();

    let ids = index.add_all(vectors.clone());
    println!(
        "Inserted {} vectors (ids {}..={}).\n",
        index.len(),
        ids[0],
        ids[ids.len() - 1]
    );

    // ---------------------------------------------------------------
    // 3. Query with one of the inserted vectors; print top-5 results.
    // ---------------------------------------------------------------
    println!("=== Step 3: Query top-5 nearest neighbors for vector #0 ===");

    let candidates = index.search(&vectors[0]);
    println!("  Candidate set size: {}", candidates.len());
    for (rank, r) in index.search_knn(&vectors[0], 5).iter().enumerate() {
        println!("  rank={} id={:<6} distance={:.6}", rank + 1, r.id, r.distance);
    }
    println!();

    // ---------------------------------------------------------------
    // 4. Fixed-size output: unused slots hold the sentinel.
    // ---------------------------------------------------------------
    println!("=== Step 4: Padded query on a sparse index ===");
    let mut small = VectorLshIndex::builder()
        .dim(DIM)
        .num_tables(4)
        .seed(7)
        .build()
        .expect("failed to build index");
    small.add_all(vectors[..2].iter().cloned());

    for (id, distance) in small.search_knn_padded(&vectors[0], 5) {
        println!("  id={:<3} distance={}", id, distance);
    }
    println!();

    // ---------------------------------------------------------------
    // 5. Show index stats.
    // ---------------------------------------------------------------
    println!("=== Step 5: Index statistics ===");
    let stats = index.stats();
    println!("  {}", stats);
    println!("  Points:           {}", stats.num_points);
    println!("  Tables:           {}", stats.num_tables);
    println!("  Total buckets:    {}", stats.total_buckets);
    println!("  Avg bucket size:  {:.2}", stats.avg_bucket_size);
    println!("  Max bucket size:  {}", stats.max_bucket_size);
    println!();

    // ---------------------------------------------------------------
    // 6. Show metrics snapshot.
    // ---------------------------------------------------------------
    println!("=== Step 6: Metrics snapshot ===");
    if let Some(m) = index.metrics() {
        println!("  {}", m);
        println!("  Query count:              {}", m.query_count);
        println!("  Insert count:             {}", m.insert_count);
        println!("  Avg query time:           {:.2} us", m.avg_query_time_us);
        println!("  Avg candidates per query: {:.1}", m.avg_candidates_per_query);
        println!("  Bucket hit rate:          {:.1}%", m.hit_rate * 100.0);
    } else {
        println!("  Metrics not enabled.");
    }
    println!();

    // ---------------------------------------------------------------
    // 7. Custom objects: words keyed on their length and first letter.
    // ---------------------------------------------------------------
    println!("=== Step 7: Index over custom objects ===");
    let tables: Vec<DynHashFunction<String>> = vec![
        Box::new(hash_fn(|w: &String| w.len() as HashCode)),
        Box::new(hash_fn(|w: &String| {
            w.bytes().next().map_or(0, HashCode::from)
        })),
    ];
    let distance = distance_fn(|a: &String, b: &String| {
        let common = a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count();
        (a.len().max(b.len()) - common) as f32
    });
    let mut words = LshIndex::new(tables, distance).expect("failed to build index");
    words.add_all(
        ["hash", "hashing", "bucket", "table", "heap", "hasher"]
            .into_iter()
            .map(String::from),
    );

    let query = String::from("hashes");
    for n in words.search_knn(&query, 3) {
        println!("  {:<8} distance={}", words.get(n.id), n.distance);
    }
    println!();

    println!("Done.");
}
