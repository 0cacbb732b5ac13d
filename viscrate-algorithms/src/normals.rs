//! Normal estimation algorithms

use crate::nearest_neighbor::KdTree;
use nalgebra::Matrix3;
use viscrate_core::{NearestNeighborSearch, Point3f, PointCloud, Result, Vector3f, DEFAULT_NORMAL};

/// Neighbourhood size used when loading point clouds without normals
pub const DEFAULT_NORMAL_NEIGHBORS: usize = 30;

/// Estimate normals for a point cloud using k-nearest neighbors
///
/// Each normal is the eigenvector of the smallest eigenvalue of the
/// neighbourhood covariance. Orientation is not made consistent across the
/// cloud. Neighbourhoods with fewer than three points get `DEFAULT_NORMAL`.
pub fn estimate_normals(cloud: &mut PointCloud, k: usize) -> Result<()> {
    if cloud.is_empty() {
        cloud.normals = Some(Vec::new());
        return Ok(());
    }

    let tree = KdTree::new(&cloud.points)?;
    let normals: Vec<Vector3f> = cloud
        .points
        .iter()
        .map(|p| {
            let neighbors: Vec<Point3f> = tree
                .find_k_nearest(p, k)
                .into_iter()
                .map(|(idx, _)| cloud.points[idx])
                .collect();
            plane_normal(&neighbors)
        })
        .collect();

    log::debug!("estimated {} normals with k = {}", normals.len(), k);
    cloud.normals = Some(normals);
    Ok(())
}

/// Normal of the best-fit plane through `points`
fn plane_normal(points: &[Point3f]) -> Vector3f {
    if points.len() < 3 {
        return DEFAULT_NORMAL;
    }

    let n = points.len() as f32;
    let centroid = points.iter().fold(Vector3f::zeros(), |acc, p| acc + p.coords) / n;

    let covariance = points.iter().fold(Matrix3::<f32>::zeros(), |acc, p| {
        let d = p.coords - centroid;
        acc + d * d.transpose()
    }) / n;

    let eigen = covariance.symmetric_eigen();
    let smallest = eigen.eigenvalues.imin();
    eigen
        .eigenvectors
        .column(smallest)
        .into_owned()
        .try_normalize(f32::EPSILON)
        .unwrap_or(DEFAULT_NORMAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tilted_plane_normals() {
        // z = 0.5x + 0.25y, slightly sheared in-plane
        let mut points = Vec::new();
        for i in 0..12 {
            for j in 0..12 {
                let x = i as f32 + 0.013 * j as f32;
                let y = j as f32 + 0.017 * i as f32;
                points.push(Point3f::new(x, y, 0.5 * x + 0.25 * y));
            }
        }
        let mut cloud = PointCloud::from_points(points);

        estimate_normals(&mut cloud, DEFAULT_NORMAL_NEIGHBORS).unwrap();

        let expected = Vector3f::new(-0.5, -0.25, 1.0).normalize();
        let normals = cloud.normals.as_ref().unwrap();
        assert_eq!(normals.len(), cloud.len());
        for n in normals {
            assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-4);
            assert_relative_eq!(n.dot(&expected).abs(), 1.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_exactly_flat_grid() {
        let points: Vec<Point3f> = (0..20)
            .flat_map(|i| (0..20).map(move |j| Point3f::new(i as f32 * 0.5, j as f32 * 0.5, 0.0)))
            .collect();
        let mut cloud = PointCloud::from_points(points);

        estimate_normals(&mut cloud, DEFAULT_NORMAL_NEIGHBORS).unwrap();

        for n in cloud.normals.as_ref().unwrap() {
            assert_relative_eq!(n.z.abs(), 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_tiny_cloud_gets_default_normals() {
        let mut cloud = PointCloud::from_points(vec![Point3f::origin(), Point3f::new(1.0, 0.0, 0.0)]);
        estimate_normals(&mut cloud, 30).unwrap();
        assert_eq!(cloud.normals.unwrap(), vec![DEFAULT_NORMAL; 2]);
    }

    #[test]
    fn test_empty_cloud() {
        let mut cloud = PointCloud::new();
        estimate_normals(&mut cloud, 30).unwrap();
        assert!(cloud.normals.unwrap().is_empty());
    }
}
