// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Flags → shader variant selection.

Every effect is described by one [`EffectSchema`]: which flags it accepts, how each flag
contributes to a permutation number, and two lookup tables from permutation number to vertex
and pixel shader variant.  Selection is a pure function of the schema and the flags.
*/

use crate::effects::{EffectError, EffectFlags, LightingMode};

/// When a [`Weight`] contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Every bit of the flags is set.
    Set(EffectFlags),
    /// No bit of the flags is set.
    Clear(EffectFlags),
    Lighting(LightingMode),
}

impl Condition {
    pub fn holds(self, flags: EffectFlags) -> bool {
        match self {
            Condition::Set(f) => flags.contains(f),
            Condition::Clear(f) => !flags.intersects(f),
            Condition::Lighting(mode) => flags.lighting_mode() == mode,
        }
    }
}

/// Adds `value` to the permutation number when `when` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weight {
    pub when: Condition,
    pub value: u32,
}

impl Weight {
    pub const fn new(when: Condition, value: u32) -> Self {
        Weight { when, value }
    }
}

/// Static description of one effect's permutation space.
#[derive(Debug)]
pub struct EffectSchema {
    pub name: &'static str,
    /// Flags the effect accepts.  Anything outside is refused.
    pub supported: EffectFlags,
    pub weights: &'static [Weight],
    /// Permutation → index into `vertex_shaders`.
    pub vertex_shader_indices: &'static [u8],
    /// Permutation → index into `pixel_shaders`.
    pub pixel_shader_indices: &'static [u8],
    pub vertex_shaders: &'static [&'static str],
    pub pixel_shaders: &'static [&'static str],
}

/// Result of [`EffectSchema::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderSelection {
    pub permutation: u32,
    pub vertex_shader: usize,
    pub pixel_shader: usize,
    pub vertex_shader_name: &'static str,
    pub pixel_shader_name: &'static str,
}

impl EffectSchema {
    /// Number of distinct permutations.
    pub fn permutation_count(&self) -> usize {
        self.vertex_shader_indices.len()
    }

    /// The named flags this effect accepts, e.g. to enumerate its flag space.
    pub fn feature_flags(&self) -> impl Iterator<Item = (&'static str, EffectFlags)> + '_ {
        EffectFlags::all()
            .iter_names()
            .filter(|(_, flag)| self.supported.contains(*flag))
    }

    pub fn permutation(&self, flags: EffectFlags) -> Result<u32, EffectError> {
        let unsupported = flags.difference(self.supported);
        if !unsupported.is_empty() {
            logwise::warn_sync!(
                "{effect} refused unsupported flags {flags}",
                effect = logwise::privacy::LogIt(self.name),
                flags = logwise::privacy::LogIt(unsupported)
            );
            return Err(EffectError::UnsupportedFlags {
                effect: self.name,
                flags: unsupported,
            });
        }
        Ok(self
            .weights
            .iter()
            .filter(|w| w.when.holds(flags))
            .map(|w| w.value)
            .sum())
    }

    pub fn select(&self, flags: EffectFlags) -> Result<ShaderSelection, EffectError> {
        let permutation = self.permutation(flags)?;
        let out_of_range = || EffectError::PermutationOutOfRange {
            effect: self.name,
            permutation,
        };
        let p = permutation as usize;
        let vertex_shader = *self.vertex_shader_indices.get(p).ok_or_else(out_of_range)? as usize;
        let pixel_shader = *self.pixel_shader_indices.get(p).ok_or_else(out_of_range)? as usize;
        Ok(ShaderSelection {
            permutation,
            vertex_shader,
            pixel_shader,
            vertex_shader_name: self.vertex_shaders.get(vertex_shader).ok_or_else(out_of_range)?,
            pixel_shader_name: self.pixel_shaders.get(pixel_shader).ok_or_else(out_of_range)?,
        })
    }
}
