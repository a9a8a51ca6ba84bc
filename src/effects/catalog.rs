// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The stock effects.

Each schema lists the flags the effect accepts, the permutation weights, and the permutation →
shader variant tables.  Variant names double as shader entry point names.
*/

use crate::effects::permutation::{Condition, EffectSchema, Weight};
use crate::effects::{EffectFlags, LightingMode};

const BASIC_WEIGHTS: &[Weight] = &[
    Weight::new(Condition::Clear(EffectFlags::FOG), 1),
    Weight::new(Condition::Set(EffectFlags::VERTEX_COLOR), 2),
    Weight::new(Condition::Set(EffectFlags::TEXTURE), 4),
    Weight::new(Condition::Lighting(LightingMode::Vertex), 8),
    Weight::new(Condition::Lighting(LightingMode::OneLight), 16),
    Weight::new(Condition::Lighting(LightingMode::PerPixel), 24),
    Weight::new(Condition::Set(EffectFlags::BIASED_VERTEX_NORMALS.union(EffectFlags::LIGHTING)), 24),
];

const BASIC_VS_INDICES: &[u8] = &[
    0, 1, 2, 3, 4, 5, 6, 7, 8, 8, 9, 9, 10, 10, 11, 11,
    12, 12, 13, 13, 14, 14, 15, 15, 16, 16, 17, 17, 18, 18, 19, 19,
    20, 20, 21, 21, 22, 22, 23, 23, 24, 24, 25, 25, 26, 26, 27, 27,
    28, 28, 29, 29, 30, 30, 31, 31,
];

const BASIC_PS_INDICES: &[u8] = &[
    0, 1, 0, 1, 2, 3, 2, 3, 4, 5, 4, 5, 6, 7, 6, 7,
    4, 5, 4, 5, 6, 7, 6, 7, 8, 8, 8, 8, 9, 9, 9, 9,
    4, 5, 4, 5, 6, 7, 6, 7, 4, 5, 4, 5, 6, 7, 6, 7,
    8, 8, 8, 8, 9, 9, 9, 9,
];

const BASIC_VERTEX_SHADERS: &[&str] = &[
    "vs_basic",
    "vs_basic_no_fog",
    "vs_basic_vc",
    "vs_basic_vc_no_fog",
    "vs_basic_tx",
    "vs_basic_tx_no_fog",
    "vs_basic_tx_vc",
    "vs_basic_tx_vc_no_fog",
    "vs_basic_vertex_lighting",
    "vs_basic_vertex_lighting_vc",
    "vs_basic_vertex_lighting_tx",
    "vs_basic_vertex_lighting_tx_vc",
    "vs_basic_one_light",
    "vs_basic_one_light_vc",
    "vs_basic_one_light_tx",
    "vs_basic_one_light_tx_vc",
    "vs_basic_pixel_lighting",
    "vs_basic_pixel_lighting_vc",
    "vs_basic_pixel_lighting_tx",
    "vs_basic_pixel_lighting_tx_vc",
    "vs_basic_vertex_lighting_bn",
    "vs_basic_vertex_lighting_bn_vc",
    "vs_basic_vertex_lighting_bn_tx",
    "vs_basic_vertex_lighting_bn_tx_vc",
    "vs_basic_one_light_bn",
    "vs_basic_one_light_bn_vc",
    "vs_basic_one_light_bn_tx",
    "vs_basic_one_light_bn_tx_vc",
    "vs_basic_pixel_lighting_bn",
    "vs_basic_pixel_lighting_bn_vc",
    "vs_basic_pixel_lighting_bn_tx",
    "vs_basic_pixel_lighting_bn_tx_vc",
];

const BASIC_PIXEL_SHADERS: &[&str] = &[
    "ps_basic",
    "ps_basic_no_fog",
    "ps_basic_tx",
    "ps_basic_tx_no_fog",
    "ps_basic_vertex_lighting",
    "ps_basic_vertex_lighting_no_fog",
    "ps_basic_vertex_lighting_tx",
    "ps_basic_vertex_lighting_tx_no_fog",
    "ps_basic_pixel_lighting",
    "ps_basic_pixel_lighting_tx",
];

/// Unlit, vertex-lit, one-light or per-pixel lit geometry with optional texture and vertex color.
pub static BASIC: EffectSchema = EffectSchema {
    name: "BasicEffect",
    supported: EffectFlags::FOG.union(EffectFlags::VERTEX_COLOR).union(EffectFlags::TEXTURE).union(EffectFlags::LIGHTING).union(EffectFlags::ONE_LIGHT).union(EffectFlags::PER_PIXEL_LIGHTING).union(EffectFlags::BIASED_VERTEX_NORMALS),
    weights: BASIC_WEIGHTS,
    vertex_shader_indices: BASIC_VS_INDICES,
    pixel_shader_indices: BASIC_PS_INDICES,
    vertex_shaders: BASIC_VERTEX_SHADERS,
    pixel_shaders: BASIC_PIXEL_SHADERS,
};

const ALPHA_TEST_WEIGHTS: &[Weight] = &[
    Weight::new(Condition::Clear(EffectFlags::FOG), 1),
    Weight::new(Condition::Set(EffectFlags::VERTEX_COLOR), 2),
    Weight::new(Condition::Set(EffectFlags::ALPHA_EQUALITY), 4),
];

const ALPHA_TEST_VS_INDICES: &[u8] = &[
    0, 1, 2, 3, 0, 1, 2, 3,
];

const ALPHA_TEST_PS_INDICES: &[u8] = &[
    0, 1, 0, 1, 2, 3, 2, 3,
];

const ALPHA_TEST_VERTEX_SHADERS: &[&str] = &[
    "vs_alpha_test",
    "vs_alpha_test_no_fog",
    "vs_alpha_test_vc",
    "vs_alpha_test_vc_no_fog",
];

const ALPHA_TEST_PIXEL_SHADERS: &[&str] = &[
    "ps_alpha_test_lt_gt",
    "ps_alpha_test_lt_gt_no_fog",
    "ps_alpha_test_eq_ne",
    "ps_alpha_test_eq_ne_no_fog",
];

/// Textured geometry with alpha-tested coverage.
pub static ALPHA_TEST: EffectSchema = EffectSchema {
    name: "AlphaTestEffect",
    supported: EffectFlags::FOG.union(EffectFlags::VERTEX_COLOR).union(EffectFlags::TEXTURE).union(EffectFlags::ALPHA_EQUALITY),
    weights: ALPHA_TEST_WEIGHTS,
    vertex_shader_indices: ALPHA_TEST_VS_INDICES,
    pixel_shader_indices: ALPHA_TEST_PS_INDICES,
    vertex_shaders: ALPHA_TEST_VERTEX_SHADERS,
    pixel_shaders: ALPHA_TEST_PIXEL_SHADERS,
};

const DUAL_TEXTURE_WEIGHTS: &[Weight] = &[
    Weight::new(Condition::Clear(EffectFlags::FOG), 1),
    Weight::new(Condition::Set(EffectFlags::VERTEX_COLOR), 2),
];

const DUAL_TEXTURE_VS_INDICES: &[u8] = &[
    0, 1, 2, 3,
];

const DUAL_TEXTURE_PS_INDICES: &[u8] = &[
    0, 1, 0, 1,
];

const DUAL_TEXTURE_VERTEX_SHADERS: &[&str] = &[
    "vs_dual_texture",
    "vs_dual_texture_no_fog",
    "vs_dual_texture_vc",
    "vs_dual_texture_vc_no_fog",
];

const DUAL_TEXTURE_PIXEL_SHADERS: &[&str] = &[
    "ps_dual_texture",
    "ps_dual_texture_no_fog",
];

/// Two textures modulated together, e.g. a light map over a base texture.
pub static DUAL_TEXTURE: EffectSchema = EffectSchema {
    name: "DualTextureEffect",
    supported: EffectFlags::FOG.union(EffectFlags::VERTEX_COLOR).union(EffectFlags::TEXTURE),
    weights: DUAL_TEXTURE_WEIGHTS,
    vertex_shader_indices: DUAL_TEXTURE_VS_INDICES,
    pixel_shader_indices: DUAL_TEXTURE_PS_INDICES,
    vertex_shaders: DUAL_TEXTURE_VERTEX_SHADERS,
    pixel_shaders: DUAL_TEXTURE_PIXEL_SHADERS,
};

const ENVIRONMENT_MAP_WEIGHTS: &[Weight] = &[
    Weight::new(Condition::Clear(EffectFlags::FOG), 1),
    Weight::new(Condition::Set(EffectFlags::FRESNEL), 2),
    Weight::new(Condition::Set(EffectFlags::SPECULAR), 4),
    Weight::new(Condition::Lighting(LightingMode::PerPixel), 8),
    Weight::new(Condition::Set(EffectFlags::BIASED_VERTEX_NORMALS), 16),
];

const ENVIRONMENT_MAP_VS_INDICES: &[u8] = &[
    0, 0, 1, 1, 0, 0, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2,
    3, 3, 4, 4, 3, 3, 4, 4, 5, 5, 5, 5, 5, 5, 5, 5,
];

const ENVIRONMENT_MAP_PS_INDICES: &[u8] = &[
    0, 1, 0, 1, 2, 3, 2, 3, 4, 5, 6, 7, 4, 5, 6, 7,
    0, 1, 0, 1, 2, 3, 2, 3, 4, 5, 6, 7, 4, 5, 6, 7,
];

const ENVIRONMENT_MAP_VERTEX_SHADERS: &[&str] = &[
    "vs_env_map",
    "vs_env_map_fresnel",
    "vs_env_map_pixel_lighting",
    "vs_env_map_bn",
    "vs_env_map_fresnel_bn",
    "vs_env_map_pixel_lighting_bn",
];

const ENVIRONMENT_MAP_PIXEL_SHADERS: &[&str] = &[
    "ps_env_map",
    "ps_env_map_no_fog",
    "ps_env_map_spec",
    "ps_env_map_spec_no_fog",
    "ps_env_map_pixel_lighting",
    "ps_env_map_pixel_lighting_no_fog",
    "ps_env_map_pixel_lighting_fresnel",
    "ps_env_map_pixel_lighting_fresnel_no_fog",
];

/// Lit, textured geometry reflecting a cube environment map.
pub static ENVIRONMENT_MAP: EffectSchema = EffectSchema {
    name: "EnvironmentMapEffect",
    supported: EffectFlags::FOG.union(EffectFlags::LIGHTING).union(EffectFlags::PER_PIXEL_LIGHTING).union(EffectFlags::TEXTURE).union(EffectFlags::FRESNEL).union(EffectFlags::SPECULAR).union(EffectFlags::BIASED_VERTEX_NORMALS),
    weights: ENVIRONMENT_MAP_WEIGHTS,
    vertex_shader_indices: ENVIRONMENT_MAP_VS_INDICES,
    pixel_shader_indices: ENVIRONMENT_MAP_PS_INDICES,
    vertex_shaders: ENVIRONMENT_MAP_VERTEX_SHADERS,
    pixel_shaders: ENVIRONMENT_MAP_PIXEL_SHADERS,
};

const SKINNED_WEIGHTS: &[Weight] = &[
    Weight::new(Condition::Clear(EffectFlags::FOG), 1),
    Weight::new(Condition::Lighting(LightingMode::OneLight), 2),
    Weight::new(Condition::Lighting(LightingMode::PerPixel), 4),
    Weight::new(Condition::Set(EffectFlags::BIASED_VERTEX_NORMALS), 6),
];

const SKINNED_VS_INDICES: &[u8] = &[
    0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5,
];

const SKINNED_PS_INDICES: &[u8] = &[
    0, 1, 0, 1, 2, 2, 0, 1, 0, 1, 2, 2,
];

const SKINNED_VERTEX_SHADERS: &[&str] = &[
    "vs_skinned_vertex_lighting",
    "vs_skinned_one_light",
    "vs_skinned_pixel_lighting",
    "vs_skinned_vertex_lighting_bn",
    "vs_skinned_one_light_bn",
    "vs_skinned_pixel_lighting_bn",
];

const SKINNED_PIXEL_SHADERS: &[&str] = &[
    "ps_skinned_vertex_lighting",
    "ps_skinned_vertex_lighting_no_fog",
    "ps_skinned_pixel_lighting",
];

/// Bone-animated, lit, textured geometry.  Vertex colors are not supported.
pub static SKINNED: EffectSchema = EffectSchema {
    name: "SkinnedEffect",
    supported: EffectFlags::FOG.union(EffectFlags::LIGHTING).union(EffectFlags::ONE_LIGHT).union(EffectFlags::PER_PIXEL_LIGHTING).union(EffectFlags::BIASED_VERTEX_NORMALS).union(EffectFlags::SKINNING).union(EffectFlags::TEXTURE),
    weights: SKINNED_WEIGHTS,
    vertex_shader_indices: SKINNED_VS_INDICES,
    pixel_shader_indices: SKINNED_PS_INDICES,
    vertex_shaders: SKINNED_VERTEX_SHADERS,
    pixel_shaders: SKINNED_PIXEL_SHADERS,
};

const NORMAL_MAP_WEIGHTS: &[Weight] = &[
    Weight::new(Condition::Clear(EffectFlags::FOG), 1),
    Weight::new(Condition::Set(EffectFlags::VERTEX_COLOR), 2),
    Weight::new(Condition::Set(EffectFlags::SPECULAR), 4),
    Weight::new(Condition::Set(EffectFlags::BIASED_VERTEX_NORMALS), 8),
    Weight::new(Condition::Set(EffectFlags::INSTANCING), 16),
];

const NORMAL_MAP_VS_INDICES: &[u8] = &[
    0, 0, 1, 1, 0, 0, 1, 1, 2, 2, 3, 3, 2, 2, 3, 3,
    4, 4, 5, 5, 4, 4, 5, 5, 6, 6, 7, 7, 6, 6, 7, 7,
];

const NORMAL_MAP_PS_INDICES: &[u8] = &[
    0, 1, 0, 1, 2, 3, 2, 3, 0, 1, 0, 1, 2, 3, 2, 3,
    0, 1, 0, 1, 2, 3, 2, 3, 0, 1, 0, 1, 2, 3, 2, 3,
];

const NORMAL_MAP_VERTEX_SHADERS: &[&str] = &[
    "vs_normal_map",
    "vs_normal_map_vc",
    "vs_normal_map_bn",
    "vs_normal_map_vc_bn",
    "vs_normal_map_inst",
    "vs_normal_map_vc_inst",
    "vs_normal_map_bn_inst",
    "vs_normal_map_vc_bn_inst",
];

const NORMAL_MAP_PIXEL_SHADERS: &[&str] = &[
    "ps_normal_map",
    "ps_normal_map_no_fog",
    "ps_normal_map_spec",
    "ps_normal_map_spec_no_fog",
];

/// Per-pixel lit geometry with a tangent-space normal map.  Always lit per pixel and textured.
pub static NORMAL_MAP: EffectSchema = EffectSchema {
    name: "NormalMapEffect",
    supported: EffectFlags::FOG.union(EffectFlags::VERTEX_COLOR).union(EffectFlags::SPECULAR).union(EffectFlags::BIASED_VERTEX_NORMALS).union(EffectFlags::INSTANCING).union(EffectFlags::LIGHTING).union(EffectFlags::PER_PIXEL_LIGHTING).union(EffectFlags::TEXTURE),
    weights: NORMAL_MAP_WEIGHTS,
    vertex_shader_indices: NORMAL_MAP_VS_INDICES,
    pixel_shader_indices: NORMAL_MAP_PS_INDICES,
    vertex_shaders: NORMAL_MAP_VERTEX_SHADERS,
    pixel_shaders: NORMAL_MAP_PIXEL_SHADERS,
};

const SKINNED_NORMAL_MAP_WEIGHTS: &[Weight] = &[
    Weight::new(Condition::Clear(EffectFlags::FOG), 1),
    Weight::new(Condition::Set(EffectFlags::SPECULAR), 2),
    Weight::new(Condition::Set(EffectFlags::BIASED_VERTEX_NORMALS), 4),
];

const SKINNED_NORMAL_MAP_VS_INDICES: &[u8] = &[
    0, 0, 0, 0, 1, 1, 1, 1,
];

const SKINNED_NORMAL_MAP_PS_INDICES: &[u8] = &[
    0, 1, 2, 3, 0, 1, 2, 3,
];

const SKINNED_NORMAL_MAP_VERTEX_SHADERS: &[&str] = &[
    "vs_skinned_normal_map",
    "vs_skinned_normal_map_bn",
];

const SKINNED_NORMAL_MAP_PIXEL_SHADERS: &[&str] = &[
    "ps_skinned_normal_map",
    "ps_skinned_normal_map_no_fog",
    "ps_skinned_normal_map_spec",
    "ps_skinned_normal_map_spec_no_fog",
];

/// Bone-animated variant of the normal map effect.
pub static SKINNED_NORMAL_MAP: EffectSchema = EffectSchema {
    name: "SkinnedNormalMapEffect",
    supported: EffectFlags::FOG.union(EffectFlags::SPECULAR).union(EffectFlags::BIASED_VERTEX_NORMALS).union(EffectFlags::SKINNING).union(EffectFlags::LIGHTING).union(EffectFlags::PER_PIXEL_LIGHTING).union(EffectFlags::TEXTURE),
    weights: SKINNED_NORMAL_MAP_WEIGHTS,
    vertex_shader_indices: SKINNED_NORMAL_MAP_VS_INDICES,
    pixel_shader_indices: SKINNED_NORMAL_MAP_PS_INDICES,
    vertex_shaders: SKINNED_NORMAL_MAP_VERTEX_SHADERS,
    pixel_shaders: SKINNED_NORMAL_MAP_PIXEL_SHADERS,
};

const PBR_WEIGHTS: &[Weight] = &[
    Weight::new(Condition::Set(EffectFlags::TEXTURE), 1),
    Weight::new(Condition::Set(EffectFlags::EMISSIVE), 2),
    Weight::new(Condition::Set(EffectFlags::VELOCITY), 4),
    Weight::new(Condition::Set(EffectFlags::BIASED_VERTEX_NORMALS), 8),
    Weight::new(Condition::Set(EffectFlags::INSTANCING), 16),
];

const PBR_VS_INDICES: &[u8] = &[
    0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3,
    4, 4, 4, 4, 5, 5, 5, 5, 6, 6, 6, 6, 7, 7, 7, 7,
];

const PBR_PS_INDICES: &[u8] = &[
    0, 1, 2, 3, 4, 5, 6, 7, 0, 1, 2, 3, 4, 5, 6, 7,
    0, 1, 2, 3, 4, 5, 6, 7, 0, 1, 2, 3, 4, 5, 6, 7,
];

const PBR_VERTEX_SHADERS: &[&str] = &[
    "vs_pbr",
    "vs_pbr_vel",
    "vs_pbr_bn",
    "vs_pbr_vel_bn",
    "vs_pbr_inst",
    "vs_pbr_vel_inst",
    "vs_pbr_bn_inst",
    "vs_pbr_vel_bn_inst",
];

const PBR_PIXEL_SHADERS: &[&str] = &[
    "ps_pbr",
    "ps_pbr_tx",
    "ps_pbr_em",
    "ps_pbr_tx_em",
    "ps_pbr_vel",
    "ps_pbr_tx_vel",
    "ps_pbr_em_vel",
    "ps_pbr_tx_em_vel",
];

/// Physically based metal/roughness shading, always lit per pixel.
pub static PBR: EffectSchema = EffectSchema {
    name: "PbrEffect",
    supported: EffectFlags::TEXTURE.union(EffectFlags::EMISSIVE).union(EffectFlags::VELOCITY).union(EffectFlags::BIASED_VERTEX_NORMALS).union(EffectFlags::INSTANCING).union(EffectFlags::LIGHTING).union(EffectFlags::PER_PIXEL_LIGHTING),
    weights: PBR_WEIGHTS,
    vertex_shader_indices: PBR_VS_INDICES,
    pixel_shader_indices: PBR_PS_INDICES,
    vertex_shaders: PBR_VERTEX_SHADERS,
    pixel_shaders: PBR_PIXEL_SHADERS,
};

const SKINNED_PBR_WEIGHTS: &[Weight] = &[
    Weight::new(Condition::Set(EffectFlags::TEXTURE), 1),
    Weight::new(Condition::Set(EffectFlags::EMISSIVE), 2),
    Weight::new(Condition::Set(EffectFlags::VELOCITY), 4),
    Weight::new(Condition::Set(EffectFlags::BIASED_VERTEX_NORMALS), 8),
];

const SKINNED_PBR_VS_INDICES: &[u8] = &[
    0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3,
];

const SKINNED_PBR_PS_INDICES: &[u8] = &[
    0, 1, 2, 3, 4, 5, 6, 7, 0, 1, 2, 3, 4, 5, 6, 7,
];

const SKINNED_PBR_VERTEX_SHADERS: &[&str] = &[
    "vs_skinned_pbr",
    "vs_skinned_pbr_vel",
    "vs_skinned_pbr_bn",
    "vs_skinned_pbr_vel_bn",
];

const SKINNED_PBR_PIXEL_SHADERS: &[&str] = &[
    "ps_skinned_pbr",
    "ps_skinned_pbr_tx",
    "ps_skinned_pbr_em",
    "ps_skinned_pbr_tx_em",
    "ps_skinned_pbr_vel",
    "ps_skinned_pbr_tx_vel",
    "ps_skinned_pbr_em_vel",
    "ps_skinned_pbr_tx_em_vel",
];

/// Bone-animated variant of the physically based effect.
pub static SKINNED_PBR: EffectSchema = EffectSchema {
    name: "SkinnedPbrEffect",
    supported: EffectFlags::TEXTURE.union(EffectFlags::EMISSIVE).union(EffectFlags::VELOCITY).union(EffectFlags::BIASED_VERTEX_NORMALS).union(EffectFlags::SKINNING).union(EffectFlags::LIGHTING).union(EffectFlags::PER_PIXEL_LIGHTING),
    weights: SKINNED_PBR_WEIGHTS,
    vertex_shader_indices: SKINNED_PBR_VS_INDICES,
    pixel_shader_indices: SKINNED_PBR_PS_INDICES,
    vertex_shaders: SKINNED_PBR_VERTEX_SHADERS,
    pixel_shaders: SKINNED_PBR_PIXEL_SHADERS,
};

const DEBUG_WEIGHTS: &[Weight] = &[
    Weight::new(Condition::Set(EffectFlags::VERTEX_COLOR), 1),
    Weight::new(Condition::Set(EffectFlags::BIASED_VERTEX_NORMALS), 2),
    Weight::new(Condition::Set(EffectFlags::INSTANCING), 4),
];

const DEBUG_VS_INDICES: &[u8] = &[
    0, 1, 2, 3, 4, 5, 6, 7,
];

const DEBUG_PS_INDICES: &[u8] = &[
    0, 0, 0, 0, 0, 0, 0, 0,
];

const DEBUG_VERTEX_SHADERS: &[&str] = &[
    "vs_debug",
    "vs_debug_vc",
    "vs_debug_bn",
    "vs_debug_vc_bn",
    "vs_debug_inst",
    "vs_debug_vc_inst",
    "vs_debug_bn_inst",
    "vs_debug_vc_bn_inst",
];

const DEBUG_PIXEL_SHADERS: &[&str] = &[
    "ps_debug",
];

/// Visualizes normals, tangents or vertex colors.
pub static DEBUG: EffectSchema = EffectSchema {
    name: "DebugEffect",
    supported: EffectFlags::VERTEX_COLOR.union(EffectFlags::BIASED_VERTEX_NORMALS).union(EffectFlags::INSTANCING),
    weights: DEBUG_WEIGHTS,
    vertex_shader_indices: DEBUG_VS_INDICES,
    pixel_shader_indices: DEBUG_PS_INDICES,
    vertex_shaders: DEBUG_VERTEX_SHADERS,
    pixel_shaders: DEBUG_PIXEL_SHADERS,
};

/// Every effect in the catalog.
pub static ALL: &[&EffectSchema] = &[&BASIC, &ALPHA_TEST, &DUAL_TEXTURE, &ENVIRONMENT_MAP, &SKINNED, &NORMAL_MAP, &SKINNED_NORMAL_MAP, &PBR, &SKINNED_PBR, &DEBUG];

/// Looks a schema up by its name, e.g. `"BasicEffect"`.
pub fn by_name(name: &str) -> Option<&'static EffectSchema> {
    ALL.iter().copied().find(|schema| schema.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lengths_agree() {
        for schema in ALL {
            assert_eq!(
                schema.vertex_shader_indices.len(),
                schema.pixel_shader_indices.len(),
                "{}",
                schema.name
            );
        }
    }

    #[test]
    fn basic_selection() {
        let s = BASIC.select(EffectFlags::FOG).unwrap();
        assert_eq!(s.permutation, 0);
        assert_eq!(s.vertex_shader_name, "vs_basic");
        assert_eq!(s.pixel_shader_name, "ps_basic");

        let s = BASIC.select(EffectFlags::TEXTURE | EffectFlags::VERTEX_COLOR).unwrap();
        assert_eq!(s.permutation, 7);
        assert_eq!(s.vertex_shader_name, "vs_basic_tx_vc_no_fog");
        assert_eq!(s.pixel_shader_name, "ps_basic_tx_no_fog");

        let s = BASIC
            .select(EffectFlags::PER_PIXEL_LIGHTING | EffectFlags::TEXTURE | EffectFlags::FOG)
            .unwrap();
        assert_eq!(s.permutation, 28);
        assert_eq!(s.vertex_shader_name, "vs_basic_pixel_lighting_tx");
        assert_eq!(s.pixel_shader_name, "ps_basic_pixel_lighting_tx");

        let s = BASIC
            .select(EffectFlags::ONE_LIGHT | EffectFlags::BIASED_VERTEX_NORMALS)
            .unwrap();
        assert_eq!(s.permutation, 41);
        assert_eq!(s.vertex_shader_name, "vs_basic_one_light_bn");
        assert_eq!(s.pixel_shader_name, "ps_basic_vertex_lighting_no_fog");
    }

    #[test]
    fn biased_normals_ignored_when_unlit() {
        let plain = BASIC.permutation(EffectFlags::FOG).unwrap();
        let biased = BASIC
            .permutation(EffectFlags::FOG | EffectFlags::BIASED_VERTEX_NORMALS)
            .unwrap();
        assert_eq!(plain, biased);
    }

    #[test]
    fn skinned_refuses_vertex_color() {
        assert!(SKINNED.select(EffectFlags::VERTEX_COLOR).is_err());
        let s = SKINNED
            .select(EffectFlags::PER_PIXEL_LIGHTING | EffectFlags::BIASED_VERTEX_NORMALS)
            .unwrap();
        assert_eq!(s.vertex_shader_name, "vs_skinned_pixel_lighting_bn");
        assert_eq!(s.pixel_shader_name, "ps_skinned_pixel_lighting");
    }

    #[test]
    fn alpha_function_picks_pixel_shader() {
        let s = ALPHA_TEST
            .select(EffectFlags::FOG | EffectFlags::TEXTURE | EffectFlags::ALPHA_EQUALITY)
            .unwrap();
        assert_eq!(s.permutation, 4);
        assert_eq!(s.vertex_shader_name, "vs_alpha_test");
        assert_eq!(s.pixel_shader_name, "ps_alpha_test_eq_ne");
        let s = ALPHA_TEST
            .select(EffectFlags::VERTEX_COLOR | EffectFlags::ALPHA_EQUALITY)
            .unwrap();
        assert_eq!(s.permutation, 7);
        assert_eq!(s.vertex_shader_name, "vs_alpha_test_vc_no_fog");
        assert_eq!(s.pixel_shader_name, "ps_alpha_test_eq_ne_no_fog");
        //only alpha-tested effects know the flag
        assert!(BASIC.select(EffectFlags::ALPHA_EQUALITY).is_err());
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(by_name("PbrEffect").map(|s| s.name), Some("PbrEffect"));
        assert!(by_name("NoSuchEffect").is_none());
    }
}
