//! Loading files written by viscrate-io through the public loader

use approx::assert_relative_eq;
use std::path::PathBuf;
use viscrate_core::{Geometry, Point3f, PointCloud, TriangleMesh};
use viscrate_io::{write_point_cloud, write_triangle_mesh, WriteOptions};
use viscrate_visualization::load_geometry;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("viscrate_loading_{}_{}", std::process::id(), name))
}

/// Points on a slightly curved sheet
fn sheet(n: usize) -> Vec<Point3f> {
    let mut points = Vec::new();
    for i in 0..n {
        for j in 0..n {
            let (x, y) = (i as f32 * 0.05, j as f32 * 0.05);
            points.push(Point3f::new(x, y, 0.02 * (x * 3.0).sin()));
        }
    }
    points
}

#[test]
fn test_binary_ply_mesh_is_completed() {
    let path = temp_path("quad.ply");
    let mesh = TriangleMesh::from_vertices_and_faces(
        vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(1.0, 1.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    );
    write_triangle_mesh(&path, &mesh, &WriteOptions { write_ascii: false }).unwrap();

    let Some(Geometry::TriangleMesh(loaded)) = load_geometry(&path) else {
        panic!("expected a mesh");
    };
    assert_eq!(loaded.face_count(), 2);
    assert_eq!(loaded.normals.as_ref().unwrap().len(), 4);
    assert_eq!(loaded.triangle_uvs.as_ref().unwrap().len(), 6);
    assert!(loaded.triangle_uvs.unwrap().iter().all(|uv| *uv == [0.0, 0.0]));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_ply_without_faces_gets_unit_normals() {
    let path = temp_path("sheet.ply");
    write_point_cloud(&path, &PointCloud::from_points(sheet(10)), &WriteOptions::default()).unwrap();

    let Some(Geometry::PointCloud(cloud)) = load_geometry(&path) else {
        panic!("expected a point cloud");
    };
    let normals = cloud.normals.as_ref().unwrap();
    assert_eq!(normals.len(), 100);
    for n in normals {
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-5);
        // the sheet is nearly flat in z
        assert!(n.z.abs() > 0.9);
    }

    let _ = std::fs::remove_file(&path);
}
