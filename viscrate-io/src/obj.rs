//! OBJ format support
//!
//! Geometry comes from the `obj` crate. Materials are read from the
//! referenced `mtllib` files by [`crate::mtl`], which understands the PBR
//! extension keys.

use crate::mtl::read_mtl;
use crate::registry::{GeometryProbe, MeshReader, MeshWriter, PointCloudReader, WriteOptions};
use obj::{IndexTuple, Obj, ObjData};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use viscrate_core::{Error, FileGeometry, Point3f, PointCloud, Result, TriangleMesh, Vector3f};

pub struct ObjFormat;

fn load_obj(path: &Path) -> Result<ObjData> {
    Obj::load(path)
        .map(|obj| obj.data)
        .map_err(|e| Error::InvalidData(format!("{}: {}", path.display(), e)))
}

fn check_index(index: usize, len: usize, what: &str) -> Result<usize> {
    if index < len {
        Ok(index)
    } else {
        Err(Error::InvalidData(format!(
            "{} index {} out of range ({} available)",
            what, index, len
        )))
    }
}

/// Build a mesh from parsed OBJ data
///
/// Polygons are fan-triangulated. Texture coordinates become per-corner
/// UVs with V flipped to a top-left origin; they are kept only when every
/// corner has one. Normals are kept only when every vertex is given one.
fn mesh_from_obj(data: &ObjData) -> Result<TriangleMesh> {
    let vertex_count = data.position.len();
    let mut faces = Vec::new();
    let mut uvs = Vec::new();
    let mut all_corners_textured = true;
    let mut normals: Vec<Option<Vector3f>> = vec![None; vertex_count];

    let corner = |tuple: &IndexTuple,
                  uvs: &mut Vec<[f32; 2]>,
                  textured: &mut bool,
                  normals: &mut Vec<Option<Vector3f>>|
     -> Result<usize> {
        let &IndexTuple(position, texture, normal) = tuple;
        let position = check_index(position, vertex_count, "position")?;
        match texture {
            Some(t) => {
                let [u, v] = data.texture[check_index(t, data.texture.len(), "texture")?];
                uvs.push([u, 1.0 - v]);
            }
            None => {
                *textured = false;
                uvs.push([0.0, 0.0]);
            }
        }
        if let Some(n) = normal {
            let [x, y, z] = data.normal[check_index(n, data.normal.len(), "normal")?];
            normals[position] = Some(Vector3f::new(x, y, z));
        }
        Ok(position)
    };

    for object in &data.objects {
        for group in &object.groups {
            for poly in &group.polys {
                let tuples = &poly.0;
                for i in 1..tuples.len().saturating_sub(1) {
                    let a = corner(&tuples[0], &mut uvs, &mut all_corners_textured, &mut normals)?;
                    let b = corner(&tuples[i], &mut uvs, &mut all_corners_textured, &mut normals)?;
                    let c = corner(&tuples[i + 1], &mut uvs, &mut all_corners_textured, &mut normals)?;
                    faces.push([a, b, c]);
                }
            }
        }
    }

    let vertices = data.position.iter().map(|&[x, y, z]| Point3f::new(x, y, z)).collect();
    let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);

    if all_corners_textured && !mesh.faces.is_empty() {
        mesh.set_triangle_uvs(uvs);
    }
    if vertex_count > 0 {
        mesh.normals = normals.into_iter().collect();
    }

    Ok(mesh)
}

impl MeshReader for ObjFormat {
    fn read_mesh(&self, path: &Path) -> Result<TriangleMesh> {
        let data = load_obj(path)?;
        let mut mesh = mesh_from_obj(&data)?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        for lib in &data.material_libs {
            let mtl_path = base_dir.join(&lib.filename);
            match read_mtl(&mtl_path) {
                Ok(materials) => mesh.materials.extend(materials),
                Err(e) => log::warn!("failed to read material library {}: {}", mtl_path.display(), e),
            }
        }

        log::debug!(
            "read OBJ {}: {} vertices, {} triangles, {} materials",
            path.display(),
            mesh.vertex_count(),
            mesh.face_count(),
            mesh.materials.len()
        );
        Ok(mesh)
    }

    fn format_name(&self) -> &'static str {
        "obj"
    }
}

impl PointCloudReader for ObjFormat {
    fn read_point_cloud(&self, path: &Path) -> Result<PointCloud> {
        let data = load_obj(path)?;
        let points = data.position.iter().map(|&[x, y, z]| Point3f::new(x, y, z)).collect();
        let mut cloud = PointCloud::from_points(points);

        // normals are attached to face corners, so only a one-to-one file can carry them
        if !cloud.is_empty() && data.normal.len() == cloud.len() {
            cloud.set_normals(data.normal.iter().map(|&[x, y, z]| Vector3f::new(x, y, z)).collect());
        }
        Ok(cloud)
    }

    fn format_name(&self) -> &'static str {
        "obj"
    }
}

impl MeshWriter for ObjFormat {
    fn write_mesh(&self, mesh: &TriangleMesh, path: &Path, _options: &WriteOptions) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        writeln!(w, "# written by viscrate")?;

        for v in &mesh.vertices {
            writeln!(w, "v {} {} {}", v.x, v.y, v.z)?;
        }

        let normals = mesh.normals.as_ref().filter(|_| mesh.has_vertex_normals());
        if let Some(normals) = normals {
            for n in normals {
                writeln!(w, "vn {} {} {}", n.x, n.y, n.z)?;
            }
        }

        let uvs = mesh.triangle_uvs.as_ref().filter(|_| mesh.has_triangle_uvs());
        if let Some(uvs) = uvs {
            for [u, v] in uvs {
                writeln!(w, "vt {} {}", u, 1.0 - v)?;
            }
        }

        for (f, face) in mesh.faces.iter().enumerate() {
            write!(w, "f")?;
            for (k, &i) in face.iter().enumerate() {
                let vi = i + 1;
                let ti = 3 * f + k + 1;
                match (uvs.is_some(), normals.is_some()) {
                    (true, true) => write!(w, " {}/{}/{}", vi, ti, vi)?,
                    (true, false) => write!(w, " {}/{}", vi, ti)?,
                    (false, true) => write!(w, " {}//{}", vi, vi)?,
                    (false, false) => write!(w, " {}", vi)?,
                }
            }
            writeln!(w)?;
        }

        w.flush()?;
        Ok(())
    }

    fn format_name(&self) -> &'static str {
        "obj"
    }
}

impl GeometryProbe for ObjFormat {
    fn probe(&self, path: &Path) -> Result<FileGeometry> {
        let reader = BufReader::new(File::open(path)?);
        let mut geometry = FileGeometry::default();

        for line in reader.lines() {
            let line = line?;
            match line.split_whitespace().next() {
                Some("v") => geometry.contains_points = true,
                Some("l") => geometry.contains_lines = true,
                Some("f") => geometry.contains_triangles = true,
                _ => {}
            }
            if geometry.contains_points && geometry.contains_triangles {
                break;
            }
        }

        Ok(geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("viscrate_obj_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_quad_with_uvs() {
        let path = temp_path("quad.obj");
        std::fs::write(
            &path,
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\nf 1/1 2/2 3/3 4/4\n",
        )
        .unwrap();

        let mesh = ObjFormat.read_mesh(&path).unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
        assert!(mesh.has_triangle_uvs());
        // V is flipped
        assert_eq!(mesh.triangle_uvs.as_ref().unwrap()[0], [0.0, 1.0]);
        assert_eq!(mesh.triangle_uvs.as_ref().unwrap()[2], [1.0, 0.0]);
        assert!(mesh.normals.is_none());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_untextured_corners_drop_uvs() {
        let path = temp_path("plain.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n").unwrap();

        let mesh = ObjFormat.read_mesh(&path).unwrap();
        assert!(!mesh.has_triangle_uvs());
        assert!(mesh.has_vertex_normals());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_probe() {
        let path = temp_path("probe.obj");
        std::fs::write(&path, "# points only\nv 0 0 0\nv 1 0 0\n").unwrap();

        let probe = ObjFormat.probe(&path).unwrap();
        assert!(probe.contains_points);
        assert!(!probe.contains_triangles);

        let cloud = ObjFormat.read_point_cloud(&path).unwrap();
        assert_eq!(cloud.len(), 2);

        let _ = std::fs::remove_file(&path);
    }
}
