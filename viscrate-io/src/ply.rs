//! PLY format support

use crate::registry::{GeometryProbe, MeshReader, MeshWriter, PointCloudReader, PointCloudWriter, WriteOptions};
use ply_rs::{
    parser::Parser,
    ply::{Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType, ScalarType},
    writer::Writer,
};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use viscrate_core::{Color3, Error, FileGeometry, Point3f, PointCloud, Result, TriangleMesh, Vector3f};

/// PLY reader/writer for meshes and point clouds
pub struct PlyFormat;

/// Per-vertex data shared by the mesh and point-cloud paths
struct PlyVertices {
    positions: Vec<Point3f>,
    normals: Option<Vec<Vector3f>>,
    colors: Option<Vec<Color3>>,
}

fn read_ply_file(path: &Path) -> Result<Ply<DefaultElement>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let parser = Parser::<DefaultElement>::new();
    Ok(parser.read_ply(&mut reader)?)
}

fn read_vertices(ply: &Ply<DefaultElement>) -> Result<PlyVertices> {
    let elements = ply.payload.get("vertex").map(Vec::as_slice).unwrap_or_default();

    let mut positions = Vec::with_capacity(elements.len());
    for vertex in elements {
        positions.push(Point3f::new(
            extract_property_value(vertex, "x")?,
            extract_property_value(vertex, "y")?,
            extract_property_value(vertex, "z")?,
        ));
    }

    // Attributes count only when every vertex carries them
    let normals: Option<Vec<Vector3f>> = elements
        .iter()
        .map(|v| {
            Some(Vector3f::new(
                extract_property_value(v, "nx").ok()?,
                extract_property_value(v, "ny").ok()?,
                extract_property_value(v, "nz").ok()?,
            ))
        })
        .collect();

    let colors: Option<Vec<Color3>> = elements
        .iter()
        .map(|v| Some([extract_color(v, "red")?, extract_color(v, "green")?, extract_color(v, "blue")?]))
        .collect();

    let has_vertices = !positions.is_empty();
    Ok(PlyVertices {
        positions,
        normals: normals.filter(|_| has_vertices),
        colors: colors.filter(|_| has_vertices),
    })
}

impl PointCloudReader for PlyFormat {
    fn read_point_cloud(&self, path: &Path) -> Result<PointCloud> {
        let ply = read_ply_file(path)?;
        let vertices = read_vertices(&ply)?;

        Ok(PointCloud {
            points: vertices.positions,
            normals: vertices.normals,
            colors: vertices.colors,
        })
    }

    fn format_name(&self) -> &'static str {
        "ply"
    }
}

impl MeshReader for PlyFormat {
    fn read_mesh(&self, path: &Path) -> Result<TriangleMesh> {
        let ply = read_ply_file(path)?;
        let vertices = read_vertices(&ply)?;
        let vertex_count = vertices.positions.len();

        let mut faces = Vec::new();
        if let Some(face_element) = ply.payload.get("face") {
            for face in face_element {
                let indices = extract_face_indices(face)?;
                if let Some(&bad) = indices.iter().find(|&&i| i >= vertex_count) {
                    return Err(Error::InvalidData(format!(
                        "face references vertex {} but only {} exist",
                        bad, vertex_count
                    )));
                }
                // fan triangulation
                for i in 1..indices.len().saturating_sub(1) {
                    faces.push([indices[0], indices[i], indices[i + 1]]);
                }
            }
        }

        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices.positions, faces);
        mesh.normals = vertices.normals;
        mesh.colors = vertices.colors;
        Ok(mesh)
    }

    fn format_name(&self) -> &'static str {
        "ply"
    }
}

impl GeometryProbe for PlyFormat {
    fn probe(&self, path: &Path) -> Result<FileGeometry> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let header = Parser::<DefaultElement>::new().read_header(&mut reader)?;

        let count = |name: &str| header.elements.get(name).map_or(0, |e| e.count);
        Ok(FileGeometry {
            contains_points: count("vertex") > 0,
            contains_lines: count("edge") > 0,
            contains_triangles: count("face") > 0,
        })
    }
}

fn float_property(name: &str) -> PropertyDef {
    PropertyDef::new(name.to_string(), PropertyType::Scalar(ScalarType::Float))
}

fn color_property(name: &str) -> PropertyDef {
    PropertyDef::new(name.to_string(), PropertyType::Scalar(ScalarType::UChar))
}

fn new_ply(options: &WriteOptions) -> Ply<DefaultElement> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = if options.write_ascii {
        Encoding::Ascii
    } else {
        Encoding::BinaryLittleEndian
    };
    ply.header.comments.push("written by viscrate".to_string());
    ply
}

/// Add the vertex element definition and payload
fn add_vertices(
    ply: &mut Ply<DefaultElement>,
    positions: &[Point3f],
    normals: Option<&Vec<Vector3f>>,
    colors: Option<&Vec<Color3>>,
) {
    let normals = normals.filter(|n| n.len() == positions.len());
    let colors = colors.filter(|c| c.len() == positions.len());

    let mut vertex_element = ElementDef::new("vertex".to_string());
    vertex_element.count = positions.len();
    for name in ["x", "y", "z"] {
        vertex_element.properties.add(float_property(name));
    }
    if normals.is_some() {
        for name in ["nx", "ny", "nz"] {
            vertex_element.properties.add(float_property(name));
        }
    }
    if colors.is_some() {
        for name in ["red", "green", "blue"] {
            vertex_element.properties.add(color_property(name));
        }
    }
    ply.header.elements.add(vertex_element);

    let mut vertices = Vec::with_capacity(positions.len());
    for (i, p) in positions.iter().enumerate() {
        let mut vertex = DefaultElement::new();
        vertex.insert("x".to_string(), Property::Float(p.x));
        vertex.insert("y".to_string(), Property::Float(p.y));
        vertex.insert("z".to_string(), Property::Float(p.z));
        if let Some(normals) = normals {
            vertex.insert("nx".to_string(), Property::Float(normals[i].x));
            vertex.insert("ny".to_string(), Property::Float(normals[i].y));
            vertex.insert("nz".to_string(), Property::Float(normals[i].z));
        }
        if let Some(colors) = colors {
            vertex.insert("red".to_string(), Property::UChar(colors[i][0]));
            vertex.insert("green".to_string(), Property::UChar(colors[i][1]));
            vertex.insert("blue".to_string(), Property::UChar(colors[i][2]));
        }
        vertices.push(vertex);
    }
    ply.payload.insert("vertex".to_string(), vertices);
}

fn write_ply_file(path: &Path, ply: &mut Ply<DefaultElement>) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    Writer::new().write_ply(&mut writer, ply)?;
    Ok(())
}

impl PointCloudWriter for PlyFormat {
    fn write_point_cloud(&self, cloud: &PointCloud, path: &Path, options: &WriteOptions) -> Result<()> {
        let mut ply = new_ply(options);
        add_vertices(&mut ply, &cloud.points, cloud.normals.as_ref(), cloud.colors.as_ref());
        write_ply_file(path, &mut ply)
    }

    fn format_name(&self) -> &'static str {
        "ply"
    }
}

impl MeshWriter for PlyFormat {
    fn write_mesh(&self, mesh: &TriangleMesh, path: &Path, options: &WriteOptions) -> Result<()> {
        let mut ply = new_ply(options);
        add_vertices(&mut ply, &mesh.vertices, mesh.normals.as_ref(), mesh.colors.as_ref());

        let mut face_element = ElementDef::new("face".to_string());
        face_element.count = mesh.faces.len();
        face_element.properties.add(PropertyDef::new(
            "vertex_indices".to_string(),
            PropertyType::List(ScalarType::UChar, ScalarType::Int),
        ));
        ply.header.elements.add(face_element);

        let mut faces = Vec::with_capacity(mesh.faces.len());
        for face in &mesh.faces {
            let mut element = DefaultElement::new();
            let indices = face.iter().map(|&i| i as i32).collect();
            element.insert("vertex_indices".to_string(), Property::ListInt(indices));
            faces.push(element);
        }
        ply.payload.insert("face".to_string(), faces);

        write_ply_file(path, &mut ply)
    }

    fn format_name(&self) -> &'static str {
        "ply"
    }
}

/// Extract a property value as f32 from a PLY element
fn extract_property_value(element: &DefaultElement, name: &str) -> Result<f32> {
    match element.get(name) {
        Some(Property::Float(val)) => Ok(*val),
        Some(Property::Double(val)) => Ok(*val as f32),
        Some(Property::Int(val)) => Ok(*val as f32),
        Some(Property::UInt(val)) => Ok(*val as f32),
        Some(Property::Short(val)) => Ok(*val as f32),
        Some(Property::UShort(val)) => Ok(*val as f32),
        _ => Err(Error::InvalidData(format!(
            "Property '{}' not found or invalid type",
            name
        ))),
    }
}

/// Extract an 8-bit color channel; float channels are taken as [0, 1]
fn extract_color(element: &DefaultElement, name: &str) -> Option<u8> {
    match element.get(name)? {
        Property::UChar(val) => Some(*val),
        Property::Float(val) => Some((val.clamp(0.0, 1.0) * 255.0).round() as u8),
        Property::Double(val) => Some((val.clamp(0.0, 1.0) * 255.0).round() as u8),
        _ => None,
    }
}

/// Extract face indices from a PLY face element
fn extract_face_indices(element: &DefaultElement) -> Result<Vec<usize>> {
    let invalid = || Error::InvalidData("Face indices not found".to_string());
    match element.get("vertex_indices").or_else(|| element.get("vertex_index")) {
        Some(Property::ListInt(indices)) => indices
            .iter()
            .map(|&idx| usize::try_from(idx).map_err(|_| invalid()))
            .collect(),
        Some(Property::ListUInt(indices)) => Ok(indices.iter().map(|&idx| idx as usize).collect()),
        Some(Property::ListUShort(indices)) => Ok(indices.iter().map(|&idx| idx as usize).collect()),
        Some(Property::ListUChar(indices)) => Ok(indices.iter().map(|&idx| idx as usize).collect()),
        _ => Err(invalid()),
    }
}
