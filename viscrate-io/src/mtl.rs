//! MTL material library reader with the PBR extension keys

use crate::image_io::read_image;
use std::path::Path;
use viscrate_core::{MeshMaterial, Result, TextureSlot};

/// Parse an MTL file into named materials, in declaration order
///
/// Texture paths are resolved against the directory of the MTL file. A
/// texture that fails to load is logged and left unset.
pub fn read_mtl(path: &Path) -> Result<Vec<(String, MeshMaterial)>> {
    let text = std::fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(parse_mtl(&text, base_dir))
}

fn parse_floats(args: &[&str]) -> Vec<f32> {
    args.iter().map_while(|a| a.parse().ok()).collect()
}

fn scalar_field<'a>(material: &'a mut MeshMaterial, key: &str) -> Option<&'a mut f32> {
    Some(match key {
        "Pr" => &mut material.base_roughness,
        "Pm" => &mut material.base_metallic,
        "Ps" => &mut material.base_reflectance,
        "Pc" => &mut material.base_clearcoat,
        "Pcr" => &mut material.base_clearcoat_roughness,
        "aniso" => &mut material.base_anisotropy,
        _ => return None,
    })
}

fn map_key(key: &str) -> Option<TextureSlot> {
    Some(match key {
        "map_Kd" => TextureSlot::Albedo,
        "norm" | "map_norm" | "bump" | "map_bump" | "map_Bump" => TextureSlot::Normal,
        "map_ao" | "map_Ka" => TextureSlot::AmbientOcclusion,
        "map_Pr" => TextureSlot::Roughness,
        "map_Pm" => TextureSlot::Metallic,
        "map_Ps" => TextureSlot::Reflectance,
        "map_Pc" => TextureSlot::ClearCoat,
        "map_Pcr" => TextureSlot::ClearCoatRoughness,
        "map_aniso" => TextureSlot::Anisotropy,
        _ => return None,
    })
}

pub(crate) fn parse_mtl(text: &str, base_dir: &Path) -> Vec<(String, MeshMaterial)> {
    let mut materials: Vec<(String, MeshMaterial)> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let Some(key) = tokens.next() else { continue };
        let args: Vec<&str> = tokens.collect();

        if key == "newmtl" {
            materials.push((args.join(" "), MeshMaterial::default()));
            continue;
        }

        let Some((name, material)) = materials.last_mut() else {
            log::debug!("ignoring MTL statement '{}' before newmtl", key);
            continue;
        };

        if key == "Kd" {
            if let [r, g, b, ..] = parse_floats(&args)[..] {
                material.base_color = [r, g, b, material.base_color[3]];
            }
        } else if key == "d" {
            if let Some(&alpha) = parse_floats(&args).first() {
                material.base_color[3] = alpha;
            }
        } else if let Some(field) = scalar_field(material, key) {
            if let Some(&value) = parse_floats(&args).first() {
                *field = value;
            }
        } else if let Some(slot) = map_key(key) {
            // map options like `-bm 1.0` precede the file name
            let Some(file) = args.last() else { continue };
            let texture_path = base_dir.join(file);
            match read_image(&texture_path) {
                Ok(image) => *material.map_mut(slot) = Some(image),
                Err(e) => log::warn!(
                    "material '{}': failed to load {} map {}: {}",
                    name,
                    slot.name(),
                    texture_path.display(),
                    e
                ),
            }
        }
    }

    materials
}
