use hecate_spatial::api::{Engine, IndexKind};
use hecate_spatial::query::Query;
use hecate_spatial::{EngineConfig, Mbr2D, Point2D, Relation, ResultMode, Shape, SpatialType};

fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Shape {
    Shape::new(
        SpatialType::Polygon,
        vec![
            Point2D::new(x0, y0),
            Point2D::new(x1, y0),
            Point2D::new(x1, y1),
            Point2D::new(x0, y1),
        ],
    )
    .unwrap()
}

fn engine() -> Engine {
    let config = EngineConfig::builder()
        .dataspace(Mbr2D::new(0., 0., 1_000., 1_000.))
        .distribution_order(4)
        .partitioning_order(8)
        .worker_count(4)
        .build()
        .unwrap();
    Engine::new(config)
}

#[test]
fn range_query_across_a_partitioned_dataset() {
    let mut e = engine();
    let shapes = vec![
        square(10., 10., 20., 20.),
        square(500., 500., 510., 510.),
        square(15., 15., 25., 25.),
    ];
    let id = e.prepare_dataset(shapes, IndexKind::TwoLayer).unwrap();

    let result = e
        .query(id, None, Query::Range { window: Mbr2D::new(0., 0., 30., 30.) }, ResultMode::Collect)
        .unwrap();
    assert_eq!(result.into_pairs().len(), 2);
}

#[test]
fn predicate_join_between_two_partitioned_datasets() {
    let mut e = engine();
    let r = e
        .prepare_dataset(vec![square(0., 0., 50., 50.), square(800., 800., 810., 810.)], IndexKind::TwoLayer)
        .unwrap();
    let s = e
        .prepare_dataset(vec![square(25., 25., 75., 75.)], IndexKind::TwoLayer)
        .unwrap();

    let result = e
        .query(r, Some(s), Query::PredicateJoin { relation: Relation::Intersects }, ResultMode::Collect)
        .unwrap();
    let pairs = result.into_pairs();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].r, 0);
    assert_eq!(pairs[0].s, 0);
}

#[test]
fn knn_query_returns_nearest_neighbor_first() {
    let mut e = engine();
    let id = e
        .prepare_dataset(
            vec![square(1., 1., 2., 2.), square(500., 500., 501., 501.), square(3., 3., 4., 4.)],
            IndexKind::TwoLayer,
        )
        .unwrap();

    let result = e.query(id, None, Query::Knn { point: Point2D::new(0., 0.), k: 1 }, ResultMode::Heap(1)).unwrap();
    let neighbors = result.into_sorted_neighbors();
    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0].0, 0);
}

#[test]
fn distance_join_between_two_datasets() {
    let mut e = engine();
    let r = e.prepare_dataset(vec![square(0., 0., 1., 1.)], IndexKind::TwoLayer).unwrap();
    let s = e
        .prepare_dataset(vec![square(2., 0., 3., 1.), square(900., 900., 901., 901.)], IndexKind::TwoLayer)
        .unwrap();

    let result = e.query(r, Some(s), Query::DistanceJoin { epsilon: 2.0 }, ResultMode::Collect).unwrap();
    let pairs = result.into_pairs();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].s, 0);
}

#[test]
fn unload_dataset_then_query_returns_an_error() {
    let mut e = engine();
    let id = e.prepare_dataset(vec![square(0., 0., 1., 1.)], IndexKind::TwoLayer).unwrap();
    e.unload_dataset(id).unwrap();
    assert!(e
        .query(id, None, Query::Range { window: Mbr2D::new(0., 0., 1., 1.) }, ResultMode::Count)
        .is_err());
}
