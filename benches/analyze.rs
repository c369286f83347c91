use criterion::{Criterion, criterion_group, criterion_main};
use mesh_probe::analysis::{analyze, check_topology, triangle_corners};
use mesh_probe::ingestion::{build_model, obj_loader::parse_obj};
use mesh_probe::types::{IndexedMesh, MeshModel};

/// Generate a closed `n x n x n` lattice box: six faces of `n x n` quads.
fn make_box(n: usize) -> IndexedMesh {
    let mut positions = Vec::new();
    let mut indices = Vec::new();
    let step = 1.0 / n as f32;

    // (origin, u axis, v axis) per face, wound outward
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
    ];

    for (origin, u, v) in faces {
        let base = (positions.len() / 3) as u32;
        for j in 0..=n {
            for i in 0..=n {
                let (a, b) = (i as f32 * step, j as f32 * step);
                for k in 0..3 {
                    positions.push(origin[k] + u[k] * a + v[k] * b);
                }
            }
        }
        let row = (n + 1) as u32;
        for j in 0..n as u32 {
            for i in 0..n as u32 {
                let p0 = base + j * row + i;
                let p1 = p0 + 1;
                let p2 = p0 + row + 1;
                let p3 = p0 + row;
                indices.extend_from_slice(&[p0, p1, p2, p0, p2, p3]);
            }
        }
    }

    IndexedMesh {
        positions,
        indices,
        ..Default::default()
    }
}

fn make_obj_text(mesh: &IndexedMesh) -> String {
    let mut obj = String::with_capacity(mesh.positions.len() * 12);
    for p in mesh.positions.chunks_exact(3) {
        obj.push_str(&format!("v {} {} {}\n", p[0], p[1], p[2]));
    }
    for t in mesh.indices.chunks_exact(3) {
        obj.push_str(&format!("f {} {} {}\n", t[0] + 1, t[1] + 1, t[2] + 1));
    }
    obj
}

fn bench_analyze(c: &mut Criterion) {
    // 6 * 2 * 130^2 = 202800 triangles
    let model: MeshModel = build_model("box", "box", &make_box(130)).unwrap();

    c.bench_function("analyze_200k", |b| {
        b.iter(|| analyze(&model));
    });

    let (corners, _) = triangle_corners(&model.vertices);
    c.bench_function("topology_200k", |b| {
        b.iter(|| check_topology(corners));
    });
}

fn bench_parse(c: &mut Criterion) {
    let text = make_obj_text(&make_box(64));

    c.bench_function("parse_obj_50k", |b| {
        b.iter(|| parse_obj(text.as_bytes()).unwrap());
    });
}

criterion_group!(benches, bench_analyze, bench_parse);
criterion_main!(benches);
