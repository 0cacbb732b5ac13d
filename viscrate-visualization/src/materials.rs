//! Material properties and texture maps shared by every draw
//!
//! [`HeadlessMaterials`] holds the lit and unlit material instances and the
//! values pushed into them. It starts from fixed defaults, is overwritten by
//! the first authored material of a loaded mesh, and is then pushed to the
//! engine once before rendering begins.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::Hasher;
use viscrate_core::{Geometry, Image, MeshMaterial, Result, TextureSlot};
use viscrate_gpu::{MaterialInstanceHandle, MaterialKind, MaterialParameters, RenderEngine, TextureHandle, TextureMaps};

/// Scalar surface properties
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialProperties {
    pub base_color: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub reflectance: f32,
    pub clear_coat: f32,
    pub clear_coat_roughness: f32,
    pub anisotropy: f32,
    pub point_size: f32,
}

impl Default for MaterialProperties {
    fn default() -> Self {
        Self {
            base_color: [0.9, 0.9, 0.9],
            metallic: 0.0,
            roughness: 0.7,
            reflectance: 0.5,
            clear_coat: 0.2,
            clear_coat_roughness: 0.2,
            anisotropy: 0.0,
            point_size: 5.0,
        }
    }
}

impl MaterialProperties {
    /// Take the authored scalars of `material`; metallic is driven by its map
    fn copy_from(&mut self, material: &MeshMaterial) {
        let [r, g, b, _] = material.base_color;
        self.base_color = [r, g, b];
        self.roughness = material.base_roughness;
        self.reflectance = material.base_reflectance;
        self.clear_coat = material.base_clearcoat;
        self.clear_coat_roughness = material.base_clearcoat_roughness;
        self.anisotropy = material.base_anisotropy;
    }
}

fn map_slot(maps: &mut TextureMaps, slot: TextureSlot) -> &mut TextureHandle {
    match slot {
        TextureSlot::Albedo => &mut maps.albedo_map,
        TextureSlot::Normal => &mut maps.normal_map,
        TextureSlot::AmbientOcclusion => &mut maps.ambient_occlusion_map,
        TextureSlot::Roughness => &mut maps.roughness_map,
        TextureSlot::Metallic => &mut maps.metallic_map,
        TextureSlot::Reflectance => &mut maps.reflectance_map,
        TextureSlot::ClearCoat => &mut maps.clear_coat_map,
        TextureSlot::ClearCoatRoughness => &mut maps.clear_coat_roughness_map,
        TextureSlot::Anisotropy => &mut maps.anisotropy_map,
    }
}

fn image_fingerprint(image: &Image) -> u64 {
    let mut hasher = DefaultHasher::new();
    hasher.write_u32(image.width);
    hasher.write_u32(image.height);
    hasher.write_u32(image.num_channels);
    hasher.write_u32(image.bytes_per_channel);
    hasher.write(&image.data);
    hasher.finish()
}

/// Material state of the headless renderer
#[derive(Debug, Clone)]
pub struct HeadlessMaterials {
    pub lit: MaterialInstanceHandle,
    pub unlit: MaterialInstanceHandle,
    pub properties: MaterialProperties,
    pub maps: TextureMaps,
    uploaded: HashMap<u64, TextureHandle>,
}

impl HeadlessMaterials {
    /// Create the lit and unlit instances and install the defaults
    pub fn new<E: RenderEngine + ?Sized>(engine: &mut E) -> Result<Self> {
        let lit = engine.create_material_instance(MaterialKind::Lit)?;
        let unlit = engine.create_material_instance(MaterialKind::Unlit)?;
        Ok(Self {
            lit,
            unlit,
            properties: MaterialProperties::default(),
            maps: TextureMaps::default(),
            uploaded: HashMap::new(),
        })
    }

    /// Upload an image once; the same pixels always map to the same handle
    fn upload<E: RenderEngine + ?Sized>(&mut self, engine: &mut E, image: &Image) -> Result<TextureHandle> {
        let key = image_fingerprint(image);
        if let Some(&handle) = self.uploaded.get(&key) {
            return Ok(handle);
        }
        let handle = engine.add_texture(image)?;
        self.uploaded.insert(key, handle);
        Ok(handle)
    }

    /// Adopt the first authored material of a mesh
    ///
    /// Point clouds and meshes without materials leave the state untouched.
    /// Each valid texture map replaces the default of its slot; a failed
    /// upload keeps the default.
    pub fn prepare_geometry<E: RenderEngine + ?Sized>(&mut self, geometry: &Geometry, engine: &mut E) {
        let Some(mesh) = geometry.as_mesh() else {
            return;
        };
        let Some((name, material)) = mesh.materials.first() else {
            return;
        };
        log::info!("using material '{}' ({} defined)", name, mesh.materials.len());

        self.properties.copy_from(material);

        for slot in TextureSlot::ALL {
            let Some(image) = material.map(slot).filter(|image| image.has_data()) else {
                continue;
            };
            match self.upload(engine, image) {
                Ok(handle) => {
                    log::debug!("bound {} map ({}x{})", slot.name(), image.width, image.height);
                    *map_slot(&mut self.maps, slot) = handle;
                }
                Err(e) => log::warn!("failed to upload {} map: {}", slot.name(), e),
            }
        }

        self.properties.metallic = if material.has_valid_map(TextureSlot::Metallic) {
            1.0
        } else {
            0.0
        };
    }

    /// Parameters of the lit instance
    pub fn lit_parameters(&self) -> MaterialParameters {
        let p = &self.properties;
        MaterialParameters {
            base_color: p.base_color,
            metallic: p.metallic,
            roughness: p.roughness,
            reflectance: p.reflectance,
            clear_coat: p.clear_coat,
            clear_coat_roughness: p.clear_coat_roughness,
            anisotropy: p.anisotropy,
            point_size: p.point_size,
            maps: self.maps,
        }
    }

    /// Parameters of the unlit instance: base color and albedo only
    pub fn unlit_parameters(&self) -> MaterialParameters {
        MaterialParameters {
            base_color: self.properties.base_color,
            point_size: self.properties.point_size,
            maps: TextureMaps {
                albedo_map: self.maps.albedo_map,
                ..TextureMaps::default()
            },
            ..MaterialParameters::default()
        }
    }

    /// Push the current state into the engine's material instances
    pub fn set_material_properties<E: RenderEngine + ?Sized>(&self, engine: &mut E) -> Result<()> {
        engine.update_material_instance(self.lit, &self.lit_parameters())?;
        engine.update_material_instance(self.unlit, &self.unlit_parameters())?;
        Ok(())
    }

    /// Instance to bind for a material choice; `None` for normals visualization
    pub fn instance_for(&self, kind: MaterialKind) -> Option<MaterialInstanceHandle> {
        match kind {
            MaterialKind::Lit => Some(self.lit),
            MaterialKind::Unlit => Some(self.unlit),
            MaterialKind::Normals => None,
        }
    }
}
