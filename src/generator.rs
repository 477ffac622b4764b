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

//! Generates the vertex and fragment shaders for a [`ShaderKey`].
//!
//! The output targets GLSL ES 1.00, the lowest common denominator of the
//! displays a compositor ends up driving. Every variant declares only what it
//! uses, so the driver never pays for a uniform or varying the draw does not
//! need.

use crate::description::TextureTarget;
use crate::formatter::SourceBuilder;
use crate::key::{BlendMode, Opacity, ShaderKey};

use self::names::*;

/// The GLSL identifiers shared between the generator and program backends.
///
/// Backends resolve attribute and uniform locations against these constants,
/// so the two sides cannot drift apart.
pub mod names {
    /// Vertex position attribute, a `vec4`.
    pub const POSITION: &str = "position";

    /// Texture coordinate attribute, a `vec4`.
    pub const TEX_COORDS: &str = "texCoords";

    /// Interpolated texture coordinate, a `vec2`.
    pub const OUT_TEX_COORDS: &str = "outTexCoords";

    /// Projection matrix uniform, a `mat4`.
    pub const PROJECTION: &str = "projection";

    /// Texture coordinate transform uniform, a `mat4`.
    pub const TEXTURE_MATRIX: &str = "texture";

    /// Sampler uniform; its declared type depends on the texture target.
    pub const SAMPLER: &str = "sampler";

    /// Flat fill color uniform, a `vec4`.
    pub const COLOR: &str = "color";

    /// Plane alpha scale uniform, a `float`.
    pub const ALPHA_PLANE: &str = "alphaPlane";

    /// Color correction matrix uniform, a `mat4`.
    pub const COLOR_MATRIX: &str = "colorMatrix";

    /// Distortion polynomial coefficient uniform, a `vec4`.
    pub const DISTORT_PARAMS: &str = "distortParams";

    /// First-view transform uniform, a `mat3`.
    pub const VIEW_TRANSFORM_1: &str = "viewTransform1";

    /// Second-view transform uniform, a `mat3`.
    pub const VIEW_TRANSFORM_2: &str = "viewTransform2";

    /// First-view position varying, a `vec3`.
    pub const VIEW_POS_1: &str = "viewPos1";

    /// Second-view position varying, a `vec3`.
    pub const VIEW_POS_2: &str = "viewPos2";
}

/// Generate the vertex shader for a key.
///
/// Deterministic: equal keys produce byte-identical source, which is what
/// lets the cache treat the key as the program's whole identity.
pub fn generate_vertex_shader(key: ShaderKey) -> String {
    let mut vs = SourceBuilder::new();

    if key.is_texturing() || key.stereo {
        // The stereo body below reads the shared coordinate even when the
        // fragment side never samples, so the attribute has to exist.
        vs.line(&format!("attribute vec4 {TEX_COORDS};"));
    }
    if key.is_texturing() {
        vs.line(&format!("varying vec2 {OUT_TEX_COORDS};"));
    }
    if key.stereo {
        vs.line(&format!("varying vec3 {VIEW_POS_1};"));
        vs.line(&format!("varying vec3 {VIEW_POS_2};"));
        vs.line(&format!("uniform mat3 {VIEW_TRANSFORM_1};"));
        vs.line(&format!("uniform mat3 {VIEW_TRANSFORM_2};"));
    }
    vs.line(&format!("attribute vec4 {POSITION};"));
    vs.line(&format!("uniform mat4 {PROJECTION};"));
    vs.line(&format!("uniform mat4 {TEXTURE_MATRIX};"));

    vs.line("void main(void) {").enter_block();
    vs.line(&format!("gl_Position = {PROJECTION} * {POSITION};"));
    if key.is_texturing() {
        vs.line(&format!(
            "{OUT_TEX_COORDS} = ({TEXTURE_MATRIX} * {TEX_COORDS}).st;"
        ));
    }
    if key.stereo {
        // Each view maps the shared coordinate into its own normalized
        // window space; the fragment side tests the [0, 1] bounds.
        vs.line(&format!("vec2 uv = {TEX_COORDS}.xy;"));
        vs.line(&format!(
            "{VIEW_POS_1} = (vec3(uv, 1.0) * {VIEW_TRANSFORM_1} + 1.0) / 2.0;"
        ));
        vs.line(&format!(
            "{VIEW_POS_2} = (vec3(uv, 1.0) * {VIEW_TRANSFORM_2} + 1.0) / 2.0;"
        ));
    }
    vs.leave_block().line("}");

    vs.finish()
}

/// Generate the fragment shader for a key.
///
/// Deterministic, like the vertex side. Statement order in `main` matters:
/// sampling, the opacity pin, the plane alpha scale and color correction
/// each read what the previous step wrote.
pub fn generate_fragment_shader(key: ShaderKey) -> String {
    let mut fs = SourceBuilder::new();

    if key.texture == Some(TextureTarget::External) {
        fs.line("#extension GL_OES_EGL_image_external : require");
    }
    fs.line("precision mediump float;");
    match key.texture {
        Some(TextureTarget::External) => {
            fs.line(&format!("uniform samplerExternalOES {SAMPLER};"));
            fs.line(&format!("varying vec2 {OUT_TEX_COORDS};"));
        }
        Some(TextureTarget::TwoD) => {
            fs.line(&format!("uniform sampler2D {SAMPLER};"));
            fs.line(&format!("varying vec2 {OUT_TEX_COORDS};"));
        }
        None => {
            fs.line(&format!("uniform vec4 {COLOR};"));
        }
    }
    if key.has_plane_alpha() {
        fs.line(&format!("uniform float {ALPHA_PLANE};"));
    }
    if key.color_matrix {
        fs.line(&format!("uniform mat4 {COLOR_MATRIX};"));
    }
    if key.stereo {
        emit_distortion_helper(&mut fs);
    }

    fs.line("void main(void) {").enter_block();
    if key.is_texturing() {
        if key.stereo {
            emit_stereo_sampling(&mut fs);
        } else {
            fs.line(&format!(
                "gl_FragColor = texture2D({SAMPLER}, {OUT_TEX_COORDS});"
            ));
        }
    } else {
        fs.line(&format!("gl_FragColor = {COLOR};"));
    }
    if key.opacity == Opacity::Opaque {
        fs.line("gl_FragColor.a = 1.0;");
    }
    if key.has_plane_alpha() {
        if key.blend == BlendMode::Premultiplied {
            // Premultiplied color carries alpha in every channel, so the
            // scale has to hit all of them.
            fs.line(&format!("gl_FragColor *= {ALPHA_PLANE};"));
        } else {
            fs.line(&format!("gl_FragColor.a *= {ALPHA_PLANE};"));
        }
    }
    if key.color_matrix {
        emit_color_correction(&mut fs, key);
    }
    fs.leave_block().line("}");

    fs.finish()
}

/// The barrel distortion helper, declared ahead of `main`.
///
/// The polynomial is evaluated over the squared radius from the view center,
/// with the x term weighted by roughly `(16 / 9)^2` to account for the
/// panel's aspect ratio.
fn emit_distortion_helper(fs: &mut SourceBuilder) {
    fs.line(&format!("varying vec3 {VIEW_POS_1};"));
    fs.line(&format!("varying vec3 {VIEW_POS_2};"));
    fs.line(&format!("uniform vec4 {DISTORT_PARAMS};"));
    fs.line("vec2 distort(vec2 uv) {").enter_block();
    fs.line("vec2 p = 2.0 * uv - 1.0;");
    fs.line("p = clamp(p, vec2(-1.1), vec2(1.1));");
    fs.line("float rSq = p.x * p.x * 3.16 + p.y * p.y;");
    fs.line(&format!(
        "float warp = {DISTORT_PARAMS}.x + {DISTORT_PARAMS}.y * rSq + {DISTORT_PARAMS}.z * rSq * rSq + {DISTORT_PARAMS}.w * rSq * rSq * rSq;"
    ));
    fs.line("return p * warp / 2.0 + 0.5;");
    fs.leave_block().line("}");
}

/// Try each view in turn and sample at whichever position survives.
///
/// A fragment outside both views stays transparent black. When both views
/// claim the fragment, the later assignment wins.
fn emit_stereo_sampling(fs: &mut SourceBuilder) {
    fs.line("gl_FragColor = vec4(0.0);");
    fs.line("vec2 pos = vec2(-1.0);");
    fs.line(&format!(
        "if ({VIEW_POS_1}.x >= 0.0 && {VIEW_POS_1}.x <= 1.0 && {VIEW_POS_1}.y >= 0.0 && {VIEW_POS_1}.y <= 1.0)"
    ));
    fs.enter_block();
    fs.line(&format!("pos = distort({VIEW_POS_1}.xy);"));
    fs.leave_block();
    fs.line(&format!(
        "if ({VIEW_POS_2}.x >= 0.0 && {VIEW_POS_2}.x <= 1.0 && {VIEW_POS_2}.y >= 0.0 && {VIEW_POS_2}.y <= 1.0)"
    ));
    fs.enter_block();
    fs.line(&format!("pos = distort({VIEW_POS_2}.xy);"));
    fs.leave_block();
    fs.line("if (pos.x >= 0.0 && pos.x <= 1.0 && pos.y >= 0.0 && pos.y <= 1.0)");
    fs.enter_block();
    fs.line(&format!("gl_FragColor = texture2D({SAMPLER}, pos);"));
    fs.leave_block();
}

/// Applies the color matrix in linear space.
///
/// Premultiplied translucent color steps out of premultiplied form around
/// the correction, since the matrix is meant to act on plain color channels.
fn emit_color_correction(fs: &mut SourceBuilder, key: ShaderKey) {
    let premultiplied =
        key.opacity == Opacity::Translucent && key.blend == BlendMode::Premultiplied;

    if premultiplied {
        fs.line("gl_FragColor.rgb = gl_FragColor.rgb / gl_FragColor.a;");
    }
    fs.line("gl_FragColor.rgb = pow(gl_FragColor.rgb, vec3(2.2));");
    fs.line(&format!("gl_FragColor = {COLOR_MATRIX} * gl_FragColor;"));
    fs.line("gl_FragColor.rgb = pow(gl_FragColor.rgb, vec3(1.0 / 2.2));");
    if premultiplied {
        fs.line("gl_FragColor.rgb = gl_FragColor.rgb * gl_FragColor.a;");
    }
}
