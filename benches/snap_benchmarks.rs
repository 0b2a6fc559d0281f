use criterion::{Criterion, black_box, criterion_group, criterion_main};
use roadgrid::{AllEdges, IndexConfig, IntStore, LocationIndex, Point, Rect, RoadGraph};

/// Regular street grid: `size` x `size` nodes connected along rows and
/// columns.
fn grid_graph(size: u32) -> RoadGraph {
    let mut graph = RoadGraph::new();
    let spacing = 0.001;
    for y in 0..size {
        for x in 0..size {
            graph.add_node(y as f64 * spacing, x as f64 * spacing);
        }
    }
    for y in 0..size {
        for x in 0..size {
            let node = y * size + x;
            if x + 1 < size {
                graph.add_edge(node, node + 1);
            }
            if y + 1 < size {
                graph.add_edge(node, node + size);
            }
        }
    }
    graph
}

fn benchmark_prepare(c: &mut Criterion) {
    let mut group = c.benchmark_group("prepare");
    group.sample_size(10);

    group.bench_function("grid_40x40", |b| {
        let graph = grid_graph(40);
        b.iter(|| {
            let config = IndexConfig::default().with_min_resolution(50);
            let mut index =
                LocationIndex::with_config(&graph, IntStore::in_memory(), config).unwrap();
            index.prepare_index().unwrap();
            black_box(index.capacity())
        })
    });

    group.finish();
}

fn benchmark_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");

    let graph = grid_graph(40);
    let config = IndexConfig::default().with_min_resolution(50);
    let mut index = LocationIndex::with_config(&graph, IntStore::in_memory(), config).unwrap();
    index.prepare_index().unwrap();

    group.bench_function("find_closest", |b| {
        let mut counter = 0u32;
        b.iter(|| {
            counter = (counter + 7) % 1000;
            let lat = 0.0002 + counter as f64 * 0.000038;
            let lon = 0.0003 + counter as f64 * 0.000035;
            index
                .find_closest(black_box(lat), black_box(lon), &AllEdges)
                .unwrap()
        })
    });

    group.bench_function("range_query_quarter", |b| {
        let bbox = Rect::new(Point::new(0.0, 0.0), Point::new(0.02, 0.02));
        b.iter(|| {
            let mut count = 0u32;
            index.query(black_box(&bbox), |_| count += 1).unwrap();
            count
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_prepare, benchmark_queries);
criterion_main!(benches);
