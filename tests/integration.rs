use hashbrown::HashSet;
use lsh_knn::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn random_vector(rng: &mut StdRng, dim: usize) -> Vec<f32> {
    let normal = Normal::new(0.0f32, 1.0).unwrap();
    (0..dim).map(|_| normal.sample(rng)).collect()
}

fn make_index(dim: usize, seed: u64) -> VectorLshIndex {
    VectorLshIndex::builder()
        .dim(dim)
        .num_hashes(8)
        .num_tables(16)
        .distance_metric(DistanceMetric::Cosine)
        .seed(seed)
        .build()
        .unwrap()
}

type IntHash = FnHash<fn(&i64) -> HashCode>;
type IntDistance = FnDistance<fn(&i64, &i64) -> f32>;

fn identity(x: &i64) -> HashCode {
    *x as HashCode
}

fn abs_diff(a: &i64, b: &i64) -> f32 {
    (a - b).abs() as f32
}

/// Index over 1-D integer features with `n` identity-hash tables.
fn identity_index(n: usize) -> LshIndex<i64, IntHash, IntDistance> {
    let functions = (0..n)
        .map(|_| FnHash(identity as fn(&i64) -> HashCode))
        .collect();
    LshIndex::new(functions, FnDistance(abs_diff as fn(&i64, &i64) -> f32)).unwrap()
}

/// Every vector lands in the same bucket, so k-NN degenerates to exact search.
fn single_bucket_index(
    metric: DistanceMetric,
) -> LshIndex<Vec<f32>, FnHash<fn(&Vec<f32>) -> HashCode>, DistanceMetric> {
    fn zero(_: &Vec<f32>) -> HashCode {
        0
    }
    LshIndex::new(vec![FnHash(zero as fn(&Vec<f32>) -> HashCode)], metric).unwrap()
}

fn brute_force(data: &[Vec<f32>], query: &[f32], k: usize, metric: DistanceMetric) -> Vec<usize> {
    let mut dists: Vec<(usize, f32)> = data
        .iter()
        .enumerate()
        .map(|(id, v)| (id, metric.distance(query, v.as_slice())))
        .collect();
    dists.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    dists.into_iter().take(k).map(|(id, _)| id).collect()
}

// ---------------------------------------------------------------------------
// 1. Scenario A: identity hashes, duplicate point
// ---------------------------------------------------------------------------

#[test]
fn test_identity_tables_self_retrieval() {
    let mut index = identity_index(3);
    let ids = index.add_all(vec![10, 20, 10, 30]);
    assert_eq!(ids, vec![0, 1, 2, 3]);

    let nn = index.search_nn(&10).unwrap();
    assert!(nn.id == 0 || nn.id == 2, "unexpected id {}", nn.id);
    assert_eq!(nn.distance, 0.0);

    let hits = index.search(&10);
    let expected: HashSet<PointId> = [0, 2].into_iter().collect();
    assert_eq!(hits, expected);
}

// ---------------------------------------------------------------------------
// 2. Scenario B: K larger than the candidate set
// ---------------------------------------------------------------------------

#[test]
fn test_padded_results_with_too_few_points() {
    let mut index = single_bucket_index(DistanceMetric::Euclidean);
    index.add(vec![0.0, 0.0]);
    index.add(vec![3.0, 4.0]);

    let padded = index.search_knn_padded(&vec![0.0, 0.0], 5);
    assert_eq!(padded.len(), 5);
    assert_eq!(padded[0], (0, 0.0));
    assert_eq!(padded[1].0, 1);
    assert!((padded[1].1 - 5.0).abs() < 1e-6);
    for slot in &padded[2..] {
        assert_eq!(slot.0, SENTINEL_ID);
        assert_eq!(slot.1, f32::INFINITY);
    }

    let unpadded = index.search_knn(&vec![0.0, 0.0], 5);
    assert_eq!(unpadded.len(), 2);
}

// ---------------------------------------------------------------------------
// 3. Scenario C: empty index
// ---------------------------------------------------------------------------

#[test]
fn test_empty_index_queries() {
    let index = make_index(32, 42);
    assert_eq!(index.len(), 0);
    assert!(index.is_empty());

    let q = vec![1.0_f32; 32];
    assert!(index.search(&q).is_empty());
    assert!(index.search_knn(&q, 10).is_empty());
    assert!(index.search_nn(&q).is_none());

    let mut ids = [7i64; 4];
    let mut dists = [7.0f32; 4];
    assert_eq!(index.search_knn_into(&q, &mut ids, &mut dists).unwrap(), 0);
    assert_eq!(ids, [SENTINEL_ID; 4]);
    assert!(dists.iter().all(|d| *d == SENTINEL_DISTANCE));
}

// ---------------------------------------------------------------------------
// 4. Scenario D: add_all id assignment
// ---------------------------------------------------------------------------

#[test]
fn test_add_all_ids_fresh_and_after_inserts() {
    let mut fresh = identity_index(2);
    assert_eq!(fresh.add_all(vec![1, 2, 3]), vec![0, 1, 2]);

    let mut loaded = identity_index(2);
    for x in 0..5 {
        loaded.add(x);
    }
    assert_eq!(loaded.add_all([1, 2, 3]), vec![5, 6, 7]);
    assert_eq!(loaded.len(), 8);
    assert_eq!(*loaded.get(6), 2);
}

// ---------------------------------------------------------------------------
// 5. Every table files every point
// ---------------------------------------------------------------------------

#[test]
fn test_every_table_contains_new_id() {
    let mut index = make_index(16, 7);
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..50 {
        let v = random_vector(&mut rng, 16);
        let id = index.add(v.clone());
        let codes = index.get_bucket_id(&v);
        for (table, code) in index.tables().iter().zip(codes) {
            assert!(table.bucket(code).unwrap().contains(&id));
        }
    }
    for table in index.tables() {
        assert_eq!(table.len(), 50);
    }
}

// ---------------------------------------------------------------------------
// 6. Builder validation
// ---------------------------------------------------------------------------

#[test]
fn test_zero_dimension_error() {
    let result = VectorLshIndex::builder().dim(0).num_tables(4).build();
    assert!(matches!(result, Err(LshError::ZeroDimension)));
}

#[test]
fn test_invalid_num_hashes() {
    for n in [0, 65] {
        let result = VectorLshIndex::builder().dim(8).num_hashes(n).build();
        match result {
            Err(LshError::InvalidNumHashes(got)) => assert_eq!(got, n),
            other => panic!("expected InvalidNumHashes({n}), got: {other:?}"),
        }
    }
}

#[test]
fn test_zero_tables_error() {
    let result = VectorLshIndex::builder().dim(8).num_tables(0).build();
    assert!(matches!(result, Err(LshError::NoTables)));
}

// ---------------------------------------------------------------------------
// 7. Metric ordering over an exhaustive candidate set
// ---------------------------------------------------------------------------

#[test]
fn test_cosine_metric_ordering() {
    let mut index = single_bucket_index(DistanceMetric::Cosine);
    index.add(vec![0.0, 1.0, 0.0]);
    index.add(vec![1.0, 0.1, 0.0]);

    let results = index.search_knn(&vec![1.0, 0.0, 0.0], 2);
    assert_eq!(results[0].id, 1, "closer direction should rank first");
    assert!(results[0].distance < results[1].distance);
}

#[test]
fn test_euclidean_metric_ordering() {
    let mut index = single_bucket_index(DistanceMetric::Euclidean);
    index.add(vec![10.0, 10.0, 10.0]);
    index.add(vec![1.0, 0.0, 0.0]);

    let results = index.search_knn(&vec![0.0, 0.0, 0.0], 2);
    assert_eq!(results[0].id, 1);
    assert!((results[0].distance - 1.0).abs() < 1e-6);
}

#[test]
fn test_dot_product_metric_ordering() {
    let mut index = single_bucket_index(DistanceMetric::DotProduct);
    index.add(vec![0.1, 0.1, 0.1]);
    index.add(vec![10.0, 10.0, 10.0]);

    let results = index.search_knn(&vec![1.0, 1.0, 1.0], 2);
    assert_eq!(
        results[0].id, 1,
        "vector with higher dot product should rank first (lower negative distance)"
    );
    assert!(results[0].distance < results[1].distance);
}

// ---------------------------------------------------------------------------
// 8. Exhaustive candidate set matches brute force
// ---------------------------------------------------------------------------

#[test]
fn test_single_bucket_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(11);
    let data: Vec<Vec<f32>> = (0..200).map(|_| random_vector(&mut rng, 8)).collect();
    let mut index = single_bucket_index(DistanceMetric::Euclidean);
    index.add_all(data.clone());

    for _ in 0..10 {
        let q = random_vector(&mut rng, 8);
        let got: Vec<usize> = index.search_knn(&q, 7).iter().map(|n| n.id).collect();
        assert_eq!(got, brute_force(&data, &q, 7, DistanceMetric::Euclidean));
    }
}

// ---------------------------------------------------------------------------
// 9. Random projection recall on perturbed queries
// ---------------------------------------------------------------------------

#[test]
fn test_random_projection_finds_perturbed_source() {
    let dim = 32;
    let mut rng = StdRng::seed_from_u64(123);
    let noise = Normal::new(0.0f32, 0.05).unwrap();

    let data: Vec<Vec<f32>> = (0..1000).map(|_| random_vector(&mut rng, dim)).collect();
    let mut index = make_index(dim, 77);
    index.add_all(data.clone());

    let mut found = 0;
    let trials = 50;
    for i in 0..trials {
        let source = &data[i * 13];
        let q: Vec<f32> = source.iter().map(|x| x + noise.sample(&mut rng)).collect();
        if index.search_nn(&q).map(|n| n.id) == Some(i * 13) {
            found += 1;
        }
    }
    assert!(found >= 45, "only {found}/{trials} perturbed queries found their source");
}

#[test]
fn test_p_stable_self_retrieval() {
    let dim = 16;
    let mut rng = StdRng::seed_from_u64(9);
    let mut index = VectorLshIndex::builder()
        .dim(dim)
        .num_hashes(4)
        .num_tables(8)
        .p_stable(4.0)
        .distance_metric(DistanceMetric::Euclidean)
        .seed(3)
        .build()
        .unwrap();

    let data: Vec<Vec<f32>> = (0..300).map(|_| random_vector(&mut rng, dim)).collect();
    index.add_all(data.clone());

    for (id, v) in data.iter().enumerate().step_by(10) {
        let nn = index.search_nn(v).unwrap();
        assert_eq!(nn.id, id);
        assert!(nn.distance.abs() < 1e-6);
    }
}

// ---------------------------------------------------------------------------
// 10. Results are sorted and bounded
// ---------------------------------------------------------------------------

#[test]
fn test_results_sorted_and_bounded() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut index = VectorLshIndex::builder()
        .dim(16)
        .num_hashes(2)
        .num_tables(4)
        .seed(8)
        .build()
        .unwrap();
    index.add_all((0..400).map(|_| random_vector(&mut rng, 16)));

    for k in [0, 1, 3, 10, 50] {
        let q = random_vector(&mut rng, 16);
        let candidates = index.search(&q).len();
        let res = index.search_knn(&q, k);
        assert_eq!(res.len(), k.min(candidates));
        assert!(res.windows(2).all(|w| w[0].distance <= w[1].distance));

        let ids: HashSet<PointId> = res.iter().map(|n| n.id).collect();
        assert_eq!(ids.len(), res.len(), "duplicate ids in result");
    }
}

// ---------------------------------------------------------------------------
// 11. Batch variants agree with single queries
// ---------------------------------------------------------------------------

#[test]
fn test_batch_variants() {
    let mut rng = StdRng::seed_from_u64(21);
    let mut index = make_index(8, 3);
    index.add_all((0..100).map(|_| random_vector(&mut rng, 8)));
    let queries: Vec<Vec<f32>> = (0..5).map(|_| random_vector(&mut rng, 8)).collect();

    let knn = index.search_knn_batch(&queries, 4);
    let nn = index.search_nn_batch(&queries);
    let sets = index.search_batch(&queries);
    let codes = index.get_bucket_ids(&queries);

    for (i, q) in queries.iter().enumerate() {
        assert_eq!(knn[i], index.search_knn(q, 4));
        assert_eq!(nn[i], index.search_nn(q));
        assert_eq!(sets[i], index.search(q));
        assert_eq!(codes[i], index.get_bucket_id(q));
        assert_eq!(codes[i].len(), index.num_tables());
    }
}

// ---------------------------------------------------------------------------
// 12. Metrics and stats
// ---------------------------------------------------------------------------

#[test]
fn test_metrics_enabled_by_builder() {
    let mut index = VectorLshIndex::builder()
        .dim(8)
        .num_tables(4)
        .seed(1)
        .enable_metrics()
        .build()
        .unwrap();
    let v = vec![1.0_f32; 8];
    index.add(v.clone());
    index.search_knn(&v, 1);

    let snap = index.metrics().unwrap();
    assert_eq!(snap.insert_count, 1);
    assert_eq!(snap.query_count, 1);
    assert_eq!(snap.hit_rate, 1.0);
    assert!(snap.to_string().contains("Queries: 1"));
}

#[test]
fn test_stats_count_points_per_table() {
    let mut index = make_index(8, 2);
    let mut rng = StdRng::seed_from_u64(2);
    index.add_all((0..64).map(|_| random_vector(&mut rng, 8)));

    let stats = index.stats();
    assert_eq!(stats.num_points, 64);
    assert_eq!(stats.num_tables, 16);
    assert!(stats.total_buckets >= 16);
    assert!(stats.max_bucket_size >= 1 && stats.max_bucket_size <= 64);
    let expected_avg = (64 * 16) as f64 / stats.total_buckets as f64;
    assert!((stats.avg_bucket_size - expected_avg).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// 13. Factory construction with a library family
// ---------------------------------------------------------------------------

#[test]
fn test_factory_construction_with_array_objects() {
    use ndarray::Array1;

    let factory = RandomProjectionFactory::new(4, 6, Some(10)).unwrap();
    let mut index: LshIndex<Array1<f32>, RandomProjectionHasher, DistanceMetric> =
        LshIndex::from_factory(factory, 5, DistanceMetric::Euclidean).unwrap();
    assert_eq!(index.num_tables(), 5);

    let a = Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
    let id = index.add(a.clone());
    let nn = index.search_nn(&a).unwrap();
    assert_eq!(nn.id, id);
    assert_eq!(nn.distance, 0.0);
}

// ---------------------------------------------------------------------------
// 14. NaN distances never outrank real ones
// ---------------------------------------------------------------------------

#[test]
fn test_nan_distance_ranks_after_finite_candidates() {
    fn same_bucket(_: &f32) -> HashCode {
        0
    }
    // inf - inf yields a NaN whose sign bit is set on common targets.
    fn gap(a: &f32, b: &f32) -> f32 {
        if a.is_infinite() || b.is_infinite() {
            std::hint::black_box(f32::INFINITY) - std::hint::black_box(f32::INFINITY)
        } else {
            (a - b).abs()
        }
    }

    let mut index = LshIndex::new(
        vec![FnHash(same_bucket as fn(&f32) -> HashCode)],
        FnDistance(gap as fn(&f32, &f32) -> f32),
    )
    .unwrap();
    index.add_all([1.0, f32::INFINITY, 2.0]);

    let top2 = index.search_knn(&1.0, 2);
    assert_eq!(top2[0].id, 0);
    assert_eq!(top2[1].id, 2);

    let all = index.search_knn(&1.0, 3);
    assert_eq!(all[2].id, 1);
    assert!(all[2].distance.is_nan());
}

// ---------------------------------------------------------------------------
// 15. Wrong-dimension vectors
// ---------------------------------------------------------------------------

#[test]
fn test_wrong_dimension_reported_by_checked_ops() {
    let mut index = make_index(4, 1);
    let err = index.try_add(vec![1.0, 2.0, 3.0]).unwrap_err();
    assert!(matches!(err, LshError::DimensionMismatch { expected: 4, got: 3 }));
    assert_eq!(err.to_string(), "dimension mismatch: expected 4, got 3");
    assert_eq!(index.len(), 0);

    index.try_add(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    assert!(index.try_search_knn(&vec![1.0; 5], 1).is_err());
}

#[test]
#[should_panic(expected = "vector dimension 3 does not match hasher dimension 4")]
fn test_wrong_dimension_add_panics_with_message() {
    let mut index = make_index(4, 1);
    index.add(vec![1.0, 2.0, 3.0]);
}

#[test]
#[should_panic(expected = "out of range")]
fn test_get_unknown_id_panics() {
    let index = identity_index(1);
    index.get(0);
}
