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

//! The per-draw rendering state.

use glam::{Mat3, Mat4, Vec4};

/// Everything the compositor knows about one layer draw.
///
/// Only a few of these fields decide which shader variant gets used; the rest
/// are uniform values pushed every time the layer is drawn. [`ShaderKey`]
/// documents the split.
///
/// The default is a plain opaque white fill with identity transforms.
///
/// [`ShaderKey`]: crate::ShaderKey
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    /// The texture the layer samples from, or `None` to fill with `color`.
    pub texture: Option<TextureSource>,

    /// The flat fill color, used only when `texture` is `None`.
    pub color: Vec4,

    /// The whole-layer alpha in `[0, 1]`.
    ///
    /// Values below one select shader variants that declare an alpha-scale
    /// uniform.
    pub plane_alpha: f32,

    /// Whether the color channels arrive already multiplied by alpha.
    pub premultiplied_alpha: bool,

    /// Whether the layer is known to be fully opaque.
    pub opaque: bool,

    /// A color-correction matrix applied in linear space, if any.
    pub color_matrix: Option<Mat4>,

    /// The projection from layer space into clip space.
    pub projection: Mat4,

    /// The transform applied to incoming texture coordinates.
    pub texture_matrix: Mat4,

    /// Side-by-side dual-view sampling state, if stereo output is on.
    pub stereo: Option<StereoViews>,

    /// Lens distortion polynomial coefficients, if the draw targets a
    /// distorting display.
    ///
    /// When a stereo program is bound without coefficients, backends upload
    /// the identity polynomial `(1, 0, 0, 0)` instead.
    pub distortion: Option<Vec4>,
}

impl Default for Description {
    fn default() -> Self {
        Description {
            texture: None,
            color: Vec4::ONE,
            plane_alpha: 1.0,
            premultiplied_alpha: false,
            opaque: true,
            color_matrix: None,
            projection: Mat4::IDENTITY,
            texture_matrix: Mat4::IDENTITY,
            stereo: None,
            distortion: None,
        }
    }
}

/// A texture for a layer to sample from.
///
/// Creating and binding the texture itself is the caller's business; the
/// generated program only needs to know which unit it lives on and which
/// sampler type can read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSource {
    /// The target the texture was created for.
    pub target: TextureTarget,

    /// The texture unit the caller bound the texture to.
    pub unit: u32,
}

/// The kind of texture a layer samples from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureTarget {
    /// An external image, read through `samplerExternalOES`.
    ///
    /// This is how camera and video decoder output usually arrives.
    External,

    /// An ordinary 2D texture.
    TwoD,
}

/// Per-view transforms for side-by-side stereo sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoViews {
    /// Maps the shared texture coordinate into each view's normalized window
    /// space. Applied as `vec3(uv, 1.0) * transform`, so these are row-major
    /// in the usual column-vector reading.
    pub transforms: [Mat3; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_an_opaque_white_fill() {
        let description = Description::default();

        assert!(description.texture.is_none());
        assert_eq!(description.color, Vec4::ONE);
        assert_eq!(description.plane_alpha, 1.0);
        assert!(description.opaque);
        assert!(!description.premultiplied_alpha);
        assert!(description.color_matrix.is_none());
        assert!(description.stereo.is_none());
        assert!(description.distortion.is_none());
    }
}
