// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `layer-shade`.
//
// `layer-shade` is free software: you can redistribute it and/or modify it under the terms of
// either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
// version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `layer-shade` is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Lesser General Public License or the Mozilla Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `layer-shade`. If not, see <https://www.gnu.org/licenses/> or
// <https://www.mozilla.org/en-US/MPL/2.0/>.

//! The canonical description of a shader variant.

use crate::description::{Description, TextureTarget};

/// Lookup key for a generated program.
///
/// This captures exactly the axes of a [`Description`] that change the *text*
/// of the generated shaders. Runtime values (the actual alpha, matrices and
/// coefficients) are deliberately excluded: they are pushed as uniforms per
/// draw, and two draws that differ only in them share a program.
///
/// Keys are cheap to build, so callers generally go through
/// [`ProgramCache::use_program`] and never see one.
///
/// [`ProgramCache::use_program`]: crate::ProgramCache::use_program
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderKey {
    /// How the layer is textured, or `None` for a flat color fill.
    pub texture: Option<TextureTarget>,

    /// Whether the plane alpha is exactly one or calls for a scale uniform.
    pub alpha: PlaneAlpha,

    /// Whether color channels arrive premultiplied by alpha.
    pub blend: BlendMode,

    /// Whether the output alpha is pinned to one.
    pub opacity: Opacity,

    /// Whether a color-correction matrix is applied.
    pub color_matrix: bool,

    /// Whether side-by-side stereo sampling is generated.
    pub stereo: bool,

    /// Whether the draw is headed for a distorting display.
    ///
    /// Part of the program's identity but never consulted while generating
    /// source; the polynomial coefficients themselves are uniforms.
    pub distortion: bool,
}

/// Whether the whole-layer alpha requires a uniform multiply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlaneAlpha {
    /// The plane alpha is exactly one; no uniform is declared.
    #[default]
    EqOne,

    /// The plane alpha is below one and scales the output.
    LtOne,
}

/// How the source color channels relate to alpha.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlendMode {
    /// Color channels are independent of alpha.
    #[default]
    Normal,

    /// Color channels are already multiplied by alpha.
    Premultiplied,
}

/// Whether the output alpha is known ahead of time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Opacity {
    /// The layer covers whatever is under it; alpha is forced to one.
    #[default]
    Opaque,

    /// The layer's own alpha survives to blending.
    Translucent,
}

impl ShaderKey {
    /// Project a description down to the shader variant it needs.
    ///
    /// Pure and total: this reads only the fields listed on the key, never
    /// touches the GPU, and maps every description to some key.
    pub fn for_description(description: &Description) -> Self {
        ShaderKey {
            texture: description.texture.map(|texture| texture.target),
            alpha: if description.plane_alpha < 1.0 {
                PlaneAlpha::LtOne
            } else {
                PlaneAlpha::EqOne
            },
            blend: if description.premultiplied_alpha {
                BlendMode::Premultiplied
            } else {
                BlendMode::Normal
            },
            opacity: if description.opaque {
                Opacity::Opaque
            } else {
                Opacity::Translucent
            },
            color_matrix: description.color_matrix.is_some(),
            stereo: description.stereo.is_some(),
            distortion: description.distortion.is_some(),
        }
    }

    /// Whether this variant samples a texture at all.
    pub fn is_texturing(&self) -> bool {
        self.texture.is_some()
    }

    /// Whether this variant declares the alpha-scale uniform.
    pub fn has_plane_alpha(&self) -> bool {
        self.alpha == PlaneAlpha::LtOne
    }

    /// Every reachable key, in a stable order.
    ///
    /// The space is small (192 keys), which is what makes eager warm-up via
    /// [`ProgramCache::precompile`] a reasonable thing to do at startup.
    ///
    /// [`ProgramCache::precompile`]: crate::ProgramCache::precompile
    pub fn all() -> Vec<ShaderKey> {
        const TEXTURES: [Option<TextureTarget>; 3] = [
            None,
            Some(TextureTarget::External),
            Some(TextureTarget::TwoD),
        ];
        const FLAGS: [bool; 2] = [false, true];

        let mut keys = Vec::with_capacity(192);
        for texture in TEXTURES {
            for alpha in [PlaneAlpha::EqOne, PlaneAlpha::LtOne] {
                for blend in [BlendMode::Normal, BlendMode::Premultiplied] {
                    for opacity in [Opacity::Opaque, Opacity::Translucent] {
                        for color_matrix in FLAGS {
                            for stereo in FLAGS {
                                for distortion in FLAGS {
                                    keys.push(ShaderKey {
                                        texture,
                                        alpha,
                                        blend,
                                        opacity,
                                        color_matrix,
                                        stereo,
                                        distortion,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }

        keys
    }
}
