//! Material binding, scene assembly, lighting and the full orbit run

use super::fake_engine::FakeEngine;
use super::temp_dir;
use crate::capture::CaptureOptions;
use crate::headless::{render_geometry, run, HeadlessConfig};
use crate::lighting::{setup_lighting, IBL_INTENSITY};
use crate::materials::{HeadlessMaterials, MaterialProperties};
use crate::orbit::{frame_file_name, orbit_eye, DEFAULT_ORBIT_FRAMES};
use crate::resources::ResourceLocator;
use crate::scene::assemble_scene;
use approx::assert_relative_eq;
use nalgebra::Point3;
use std::time::Duration;
use viscrate_core::{Geometry, Image, MeshMaterial, Point3f, PointCloud, TriangleMesh, Vector3f};
use viscrate_gpu::{MaterialKind, RenderEngine, TextureHandle};
use viscrate_io::{read_image, write_triangle_mesh, WriteOptions};

/// Cube spanning [0, 2] on every axis
fn cube() -> TriangleMesh {
    let mut vertices = Vec::new();
    for &x in &[0.0, 2.0] {
        for &y in &[0.0, 2.0] {
            for &z in &[0.0, 2.0] {
                vertices.push(Point3f::new(x, y, z));
            }
        }
    }
    let faces = vec![
        [0, 1, 3], [0, 3, 2], [4, 6, 7], [4, 7, 5],
        [0, 4, 5], [0, 5, 1], [2, 3, 7], [2, 7, 6],
        [0, 2, 6], [0, 6, 4], [1, 5, 7], [1, 7, 3],
    ];
    let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
    mesh.compute_vertex_normals();
    mesh
}

fn textured_material(with_metallic: bool) -> MeshMaterial {
    let mut material = MeshMaterial {
        base_color: [0.2, 0.4, 0.6, 1.0],
        base_metallic: 0.3,
        base_roughness: 0.25,
        base_reflectance: 0.8,
        base_clearcoat: 0.5,
        base_clearcoat_roughness: 0.1,
        base_anisotropy: 0.4,
        ..MeshMaterial::default()
    };
    material.albedo = Some(Image::from_rgb8(2, 1, vec![255, 0, 0, 0, 255, 0]));
    // present but without pixels: must not replace the default
    material.roughness = Some(Image::from_rgb8(0, 0, Vec::new()));
    if with_metallic {
        material.metallic = Some(Image::from_rgb8(1, 1, vec![200, 200, 200]));
    }
    material
}

fn mesh_with(material: MeshMaterial) -> Geometry {
    let mut mesh = cube();
    mesh.materials.push(("painted".to_string(), material));
    Geometry::TriangleMesh(mesh)
}

#[test]
fn test_first_material_is_adopted() {
    let mut engine = FakeEngine::new();
    let mut materials = HeadlessMaterials::new(&mut engine).unwrap();
    materials.prepare_geometry(&mesh_with(textured_material(true)), &mut engine);

    let p = materials.properties;
    assert_eq!(p.base_color, [0.2, 0.4, 0.6]);
    assert_eq!(p.roughness, 0.25);
    assert_eq!(p.reflectance, 0.8);
    assert_eq!(p.clear_coat, 0.5);
    assert_eq!(p.clear_coat_roughness, 0.1);
    assert_eq!(p.anisotropy, 0.4);
    // the metallic map wins over the authored scalar
    assert_eq!(p.metallic, 1.0);

    assert_ne!(materials.maps.albedo_map, TextureHandle::DEFAULT_TEXTURE);
    assert_ne!(materials.maps.metallic_map, TextureHandle::DEFAULT_TEXTURE);
    assert_eq!(materials.maps.roughness_map, TextureHandle::DEFAULT_TEXTURE);
    assert_eq!(materials.maps.normal_map, TextureHandle::DEFAULT_NORMAL_MAP);
}

#[test]
fn test_metallic_is_off_without_map() {
    let mut engine = FakeEngine::new();
    let mut materials = HeadlessMaterials::new(&mut engine).unwrap();
    materials.prepare_geometry(&mesh_with(textured_material(false)), &mut engine);

    assert_eq!(materials.properties.metallic, 0.0);
    assert_eq!(materials.maps.metallic_map, TextureHandle::DEFAULT_TEXTURE);
}

#[test]
fn test_binding_twice_is_idempotent() {
    let mut engine = FakeEngine::new();
    let geometry = mesh_with(textured_material(true));
    let mut materials = HeadlessMaterials::new(&mut engine).unwrap();

    materials.prepare_geometry(&geometry, &mut engine);
    let (properties, maps, textures) = (materials.properties, materials.maps, engine.textures.len());

    materials.prepare_geometry(&geometry, &mut engine);
    assert_eq!(materials.properties, properties);
    assert_eq!(materials.maps, maps);
    assert_eq!(engine.textures.len(), textures);
}

#[test]
fn test_point_clouds_and_plain_meshes_keep_defaults() {
    let mut engine = FakeEngine::new();
    let mut materials = HeadlessMaterials::new(&mut engine).unwrap();

    let cloud = PointCloud::from_points(vec![Point3f::origin(), Point3f::new(1.0, 1.0, 1.0)]);
    materials.prepare_geometry(&Geometry::PointCloud(cloud), &mut engine);
    materials.prepare_geometry(&Geometry::TriangleMesh(cube()), &mut engine);

    assert_eq!(materials.properties, MaterialProperties::default());
    assert_eq!(engine.textures.len(), 2);
}

#[test]
fn test_failed_upload_keeps_default() {
    let mut engine = FakeEngine::new();
    let mut materials = HeadlessMaterials::new(&mut engine).unwrap();

    let mut material = textured_material(false);
    // 16-bit albedo is rejected by the engine
    material.albedo = Some(Image {
        width: 1,
        height: 1,
        num_channels: 3,
        bytes_per_channel: 2,
        data: vec![0; 6],
    });
    materials.prepare_geometry(&mesh_with(material), &mut engine);

    assert_eq!(materials.maps.albedo_map, TextureHandle::DEFAULT_TEXTURE);
    assert_eq!(materials.properties.base_color, [0.2, 0.4, 0.6]);
}

#[test]
fn test_unlit_instance_gets_color_and_albedo_only() {
    let mut engine = FakeEngine::new();
    let mut materials = HeadlessMaterials::new(&mut engine).unwrap();
    materials.prepare_geometry(&mesh_with(textured_material(true)), &mut engine);
    materials.set_material_properties(&mut engine).unwrap();

    let (lit_kind, lit) = *engine.material(materials.lit);
    assert_eq!(lit_kind, MaterialKind::Lit);
    assert_eq!(lit.roughness, 0.25);
    assert_eq!(lit.metallic, 1.0);
    assert_eq!(lit.maps, materials.maps);

    let (unlit_kind, unlit) = *engine.material(materials.unlit);
    assert_eq!(unlit_kind, MaterialKind::Unlit);
    assert_eq!(unlit.base_color, [0.2, 0.4, 0.6]);
    assert_eq!(unlit.maps.albedo_map, materials.maps.albedo_map);
    assert_eq!(unlit.maps.metallic_map, TextureHandle::DEFAULT_TEXTURE);
    assert_eq!(unlit.metallic, 0.0);
}

#[test]
fn test_scene_frames_geometry() {
    let mut engine = FakeEngine::new();
    let materials = HeadlessMaterials::new(&mut engine).unwrap();
    let geometry = Geometry::TriangleMesh(cube());

    let scene = assemble_scene(&mut engine, &geometry, &materials, MaterialKind::Normals, 64, 48).unwrap();

    assert_relative_eq!(scene.radius, 2.5);
    assert_eq!(scene.center(), Point3::new(1.0, 1.0, 1.0));

    let view = &engine.views[scene.view.index()];
    assert_eq!(view.clear_color, [1.0, 1.0, 1.0, 1.0]);
    assert_eq!((view.viewport.width, view.viewport.height), (64, 48));
    let camera = view.camera.unwrap();
    assert_relative_eq!(camera.eye, Point3::new(1.0, 1.0, 3.5));
    assert_eq!(engine.swap_chains[scene.swap_chain.index()], (64, 48));

    // the normals visualization gets its own instance, not the lit one
    let (_, bound) = engine.entities[0];
    assert_ne!(bound, materials.lit);
    assert_eq!(engine.material(bound).0, MaterialKind::Normals);
}

#[test]
fn test_scene_binds_requested_material() {
    let mut engine = FakeEngine::new();
    let materials = HeadlessMaterials::new(&mut engine).unwrap();
    let geometry = Geometry::TriangleMesh(cube());

    assemble_scene(&mut engine, &geometry, &materials, MaterialKind::Lit, 16, 16).unwrap();
    assert_eq!(engine.entities[0].1, materials.lit);
}

#[test]
fn test_lighting_halves_fail_independently() {
    let dir = temp_dir("lighting");
    std::fs::write(dir.join("hall_ibl.ktx"), b"ktx").unwrap();

    let mut engine = FakeEngine::new();
    let scene = engine.create_scene();
    let settings = setup_lighting(&mut engine, scene, &ResourceLocator::new(&dir), "hall_ibl.ktx", "hall_skybox.ktx");

    assert!(settings.ibl.is_some());
    assert!(settings.sky.is_none());
    let (_, intensity) = engine.scenes[scene.index()].indirect_light.unwrap();
    assert_eq!(intensity, IBL_INTENSITY);
    assert!(engine.scenes[scene.index()].skybox.is_none());

    let _ = std::fs::remove_dir_all(&dir);
}

fn orbit_config(name: &str, frames: u32) -> (HeadlessConfig, std::path::PathBuf) {
    let dir = temp_dir(name);
    let config = HeadlessConfig {
        width: 8,
        height: 6,
        frames,
        output_dir: dir.join("frames"),
        resource_path: Some(dir.join("resources")),
        capture: CaptureOptions {
            timeout: Duration::from_secs(5),
            begin_attempts: 3,
        },
        ..HeadlessConfig::default()
    };
    (config, dir)
}

#[test]
fn test_orbit_writes_every_frame() {
    let (mut config, dir) = orbit_config("orbit", 24);
    let model = dir.join("cube.ply");
    write_triangle_mesh(&model, &cube(), &WriteOptions::default()).unwrap();
    config.model = model;

    let mut engine = FakeEngine::new();
    engine.callback_delay = Duration::from_millis(2);
    let summary = run(&mut engine, &config).unwrap();
    engine.join();

    assert_eq!(summary.saved, 24);
    assert_eq!(summary.total(), 24);

    let mut names: Vec<String> = std::fs::read_dir(&config.output_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    let expected: Vec<String> = (0..24).map(frame_file_name).collect();
    assert_eq!(names, expected);

    let image = read_image(&config.output_dir.join("out_00023.png")).unwrap();
    assert_eq!((image.width, image.height, image.num_channels), (8, 6, 3));

    assert_eq!(engine.rendered_eyes.len(), 24);
    for (i, eye) in engine.rendered_eyes.iter().enumerate() {
        assert_relative_eq!(*eye, orbit_eye(Point3::new(1.0, 1.0, 1.0), 2.5, i as u32), epsilon = 1e-5);
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_default_orbit_has_no_gaps() {
    let (config, dir) = orbit_config("full_orbit", HeadlessConfig::default().frames);
    assert_eq!(config.frames, DEFAULT_ORBIT_FRAMES);

    let mut engine = FakeEngine::new();
    let summary = render_geometry(&mut engine, &Geometry::TriangleMesh(cube()), &config).unwrap();
    engine.join();

    assert_eq!(summary.saved, 360);
    let mut names: Vec<String> = std::fs::read_dir(&config.output_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 360);
    assert_eq!(names.first().map(String::as_str), Some("out_00000.png"));
    assert_eq!(names.last().map(String::as_str), Some("out_00359.png"));
    assert_eq!(names, (0..360).map(frame_file_name).collect::<Vec<_>>());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_point_cloud_orbit() {
    let (config, dir) = orbit_config("cloud_orbit", 3);
    let mut cloud = PointCloud::from_points(vec![
        Point3f::new(-1.0, 0.0, 0.0),
        Point3f::new(1.0, 0.0, 0.0),
        Point3f::new(0.0, 4.0, 0.0),
    ]);
    cloud.set_normals(vec![Vector3f::z(); 3]);

    let mut engine = FakeEngine::new();
    let summary = render_geometry(&mut engine, &Geometry::PointCloud(cloud), &config).unwrap();
    engine.join();

    assert_eq!(summary.saved, 3);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_unloadable_model_is_an_error() {
    let (mut config, dir) = orbit_config("bad_model", 1);
    config.model = dir.join("missing.ply");

    let mut engine = FakeEngine::new();
    assert!(run(&mut engine, &config).is_err());
    assert_eq!(engine.begin_calls, 0);
    let _ = std::fs::remove_dir_all(&dir);
}
