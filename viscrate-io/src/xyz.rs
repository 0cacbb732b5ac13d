//! XYZ point cloud format: one `x y z [nx ny nz]` record per line

use crate::registry::{GeometryProbe, PointCloudReader, PointCloudWriter, WriteOptions};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use viscrate_core::{Error, FileGeometry, Point3f, PointCloud, Result, Vector3f};

pub struct XyzFormat;

impl PointCloudReader for XyzFormat {
    fn read_point_cloud(&self, path: &Path) -> Result<PointCloud> {
        let reader = BufReader::new(File::open(path)?);

        let mut points = Vec::new();
        let mut normals = Vec::new();
        let mut all_have_normals = true;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let values = line
                .split_whitespace()
                .map(str::parse::<f32>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::InvalidData(format!("line {}: {}", line_no + 1, e)))?;

            match values[..] {
                [x, y, z, nx, ny, nz, ..] => {
                    points.push(Point3f::new(x, y, z));
                    normals.push(Vector3f::new(nx, ny, nz));
                }
                [x, y, z, ..] => {
                    points.push(Point3f::new(x, y, z));
                    all_have_normals = false;
                }
                _ => {
                    return Err(Error::InvalidData(format!(
                        "line {}: expected at least 3 values, found {}",
                        line_no + 1,
                        values.len()
                    )))
                }
            }
        }

        let mut cloud = PointCloud::from_points(points);
        if all_have_normals && !cloud.is_empty() {
            cloud.set_normals(normals);
        }
        Ok(cloud)
    }

    fn format_name(&self) -> &'static str {
        "xyz"
    }
}

impl PointCloudWriter for XyzFormat {
    fn write_point_cloud(&self, cloud: &PointCloud, path: &Path, _options: &WriteOptions) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        let normals = cloud.normals.as_ref().filter(|_| cloud.has_normals());

        for (i, p) in cloud.points.iter().enumerate() {
            match normals {
                Some(n) => writeln!(writer, "{} {} {} {} {} {}", p.x, p.y, p.z, n[i].x, n[i].y, n[i].z)?,
                None => writeln!(writer, "{} {} {}", p.x, p.y, p.z)?,
            }
        }
        writer.flush()?;
        Ok(())
    }

    fn format_name(&self) -> &'static str {
        "xyz"
    }
}

impl GeometryProbe for XyzFormat {
    fn probe(&self, path: &Path) -> Result<FileGeometry> {
        let metadata = std::fs::metadata(path)?;
        Ok(FileGeometry {
            contains_points: metadata.len() > 0,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_normals_are_dropped() {
        let path = std::env::temp_dir().join(format!("viscrate_mixed_{}.xyz", std::process::id()));
        std::fs::write(&path, "0 0 0 0 0 1\n1 0 0\n").unwrap();

        let cloud = XyzFormat.read_point_cloud(&path).unwrap();
        assert_eq!(cloud.len(), 2);
        assert!(cloud.normals.is_none());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_garbage_line_is_an_error() {
        let path = std::env::temp_dir().join(format!("viscrate_garbage_{}.xyz", std::process::id()));
        std::fs::write(&path, "0 0 0\nnot a point\n").unwrap();

        assert!(matches!(XyzFormat.read_point_cloud(&path), Err(Error::InvalidData(_))));

        let _ = std::fs::remove_file(&path);
    }
}
