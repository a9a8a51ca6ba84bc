// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Feature flags requested by an effect's user.

bitflags::bitflags! {
    /// Features an effect should render with.
    ///
    /// Composite flags carry the bits they imply, so `PER_PIXEL_LIGHTING` also reads as
    /// `LIGHTING`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct EffectFlags: u32 {
        const FOG = 1 << 0;
        const LIGHTING = 1 << 1;
        const PER_PIXEL_LIGHTING = (1 << 2) | Self::LIGHTING.bits();
        const VERTEX_COLOR = 1 << 3;
        const TEXTURE = 1 << 4;
        const INSTANCING = 1 << 5;
        const SPECULAR = 1 << 6;
        const BIASED_VERTEX_NORMALS = 1 << 7;
        const ONE_LIGHT = (1 << 8) | Self::LIGHTING.bits();
        const SKINNING = 1 << 9;
        const EMISSIVE = 1 << 10;
        const VELOCITY = 1 << 11;
        const FRESNEL = 1 << 12;
        /// Alpha test compares for equality (eq/ne) rather than ordering (lt/gt).
        const ALPHA_EQUALITY = 1 << 13;
    }
}

/// How lighting is evaluated, derived from [`EffectFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightingMode {
    None,
    /// Evaluated per vertex for every light.
    Vertex,
    /// Evaluated per vertex for a single light.
    OneLight,
    PerPixel,
}

impl EffectFlags {
    /// Per-pixel lighting wins over one-light when both are requested.
    pub fn lighting_mode(self) -> LightingMode {
        if self.contains(EffectFlags::PER_PIXEL_LIGHTING) {
            LightingMode::PerPixel
        } else if self.contains(EffectFlags::ONE_LIGHT) {
            LightingMode::OneLight
        } else if self.contains(EffectFlags::LIGHTING) {
            LightingMode::Vertex
        } else {
            LightingMode::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_flags_imply_lighting() {
        assert!(EffectFlags::PER_PIXEL_LIGHTING.contains(EffectFlags::LIGHTING));
        assert!(EffectFlags::ONE_LIGHT.contains(EffectFlags::LIGHTING));
        assert!(!EffectFlags::LIGHTING.contains(EffectFlags::ONE_LIGHT));
    }

    #[test]
    fn lighting_mode_precedence() {
        assert_eq!(EffectFlags::empty().lighting_mode(), LightingMode::None);
        assert_eq!(EffectFlags::FOG.lighting_mode(), LightingMode::None);
        assert_eq!(EffectFlags::LIGHTING.lighting_mode(), LightingMode::Vertex);
        assert_eq!(EffectFlags::ONE_LIGHT.lighting_mode(), LightingMode::OneLight);
        assert_eq!(
            (EffectFlags::ONE_LIGHT | EffectFlags::PER_PIXEL_LIGHTING).lighting_mode(),
            LightingMode::PerPixel
        );
    }
}
