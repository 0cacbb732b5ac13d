//! Authored surface materials attached to meshes

use crate::image::Image;

/// Texture slots a material can fill, in binding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Albedo,
    Normal,
    AmbientOcclusion,
    Roughness,
    Metallic,
    Reflectance,
    ClearCoat,
    ClearCoatRoughness,
    Anisotropy,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 9] = [
        TextureSlot::Albedo,
        TextureSlot::Normal,
        TextureSlot::AmbientOcclusion,
        TextureSlot::Roughness,
        TextureSlot::Metallic,
        TextureSlot::Reflectance,
        TextureSlot::ClearCoat,
        TextureSlot::ClearCoatRoughness,
        TextureSlot::Anisotropy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TextureSlot::Albedo => "albedo",
            TextureSlot::Normal => "normal",
            TextureSlot::AmbientOcclusion => "ao",
            TextureSlot::Roughness => "roughness",
            TextureSlot::Metallic => "metallic",
            TextureSlot::Reflectance => "reflectance",
            TextureSlot::ClearCoat => "clear_coat",
            TextureSlot::ClearCoatRoughness => "clear_coat_roughness",
            TextureSlot::Anisotropy => "anisotropy",
        }
    }
}

/// Physically based material as authored in a model file
#[derive(Debug, Clone, PartialEq)]
pub struct MeshMaterial {
    pub base_color: [f32; 4],
    pub base_metallic: f32,
    pub base_roughness: f32,
    pub base_reflectance: f32,
    pub base_clearcoat: f32,
    pub base_clearcoat_roughness: f32,
    pub base_anisotropy: f32,

    pub albedo: Option<Image>,
    pub normal_map: Option<Image>,
    pub ambient_occlusion: Option<Image>,
    pub roughness: Option<Image>,
    pub metallic: Option<Image>,
    pub reflectance: Option<Image>,
    pub clear_coat: Option<Image>,
    pub clear_coat_roughness: Option<Image>,
    pub anisotropy: Option<Image>,
}

impl Default for MeshMaterial {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            base_metallic: 0.0,
            base_roughness: 1.0,
            base_reflectance: 0.5,
            base_clearcoat: 0.0,
            base_clearcoat_roughness: 0.0,
            base_anisotropy: 0.0,
            albedo: None,
            normal_map: None,
            ambient_occlusion: None,
            roughness: None,
            metallic: None,
            reflectance: None,
            clear_coat: None,
            clear_coat_roughness: None,
            anisotropy: None,
        }
    }
}

impl MeshMaterial {
    /// Image bound to a slot, if any
    pub fn map(&self, slot: TextureSlot) -> Option<&Image> {
        match slot {
            TextureSlot::Albedo => self.albedo.as_ref(),
            TextureSlot::Normal => self.normal_map.as_ref(),
            TextureSlot::AmbientOcclusion => self.ambient_occlusion.as_ref(),
            TextureSlot::Roughness => self.roughness.as_ref(),
            TextureSlot::Metallic => self.metallic.as_ref(),
            TextureSlot::Reflectance => self.reflectance.as_ref(),
            TextureSlot::ClearCoat => self.clear_coat.as_ref(),
            TextureSlot::ClearCoatRoughness => self.clear_coat_roughness.as_ref(),
            TextureSlot::Anisotropy => self.anisotropy.as_ref(),
        }
    }

    pub fn map_mut(&mut self, slot: TextureSlot) -> &mut Option<Image> {
        match slot {
            TextureSlot::Albedo => &mut self.albedo,
            TextureSlot::Normal => &mut self.normal_map,
            TextureSlot::AmbientOcclusion => &mut self.ambient_occlusion,
            TextureSlot::Roughness => &mut self.roughness,
            TextureSlot::Metallic => &mut self.metallic,
            TextureSlot::Reflectance => &mut self.reflectance,
            TextureSlot::ClearCoat => &mut self.clear_coat,
            TextureSlot::ClearCoatRoughness => &mut self.clear_coat_roughness,
            TextureSlot::Anisotropy => &mut self.anisotropy,
        }
    }

    /// Whether the slot holds an image with pixel data
    pub fn has_valid_map(&self, slot: TextureSlot) -> bool {
        self.map(slot).is_some_and(Image::has_data)
    }
}
