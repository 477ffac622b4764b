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

//! A program backend for [`layer-shade`] on top of the [`glow`] crate.
//!
//! Wrap any [`HasContext`] in a [`GlowContext`] and hand it to a
//! [`ProgramCache`]. Compiled programs carry a location table covering every
//! uniform the generator can declare; binding uploads only the ones the
//! variant actually has.
//!
//! [`layer-shade`]: https://crates.io/crates/layer-shade
//! [`glow`]: https://crates.io/crates/glow
//! [`HasContext`]: https://docs.rs/glow/latest/glow/trait.HasContext.html
//! [`ProgramCache`]: https://docs.rs/layer-shade/latest/layer_shade/struct.ProgramCache.html

#![forbid(rust_2018_idioms)]

use glam::Vec4;
use glow::HasContext;
use layer_shade::{names, Description, GpuContext};

use std::fmt;
use std::mem;

/// The uniforms a generated program may declare.
#[derive(Debug, Clone, Copy)]
enum Uniform {
    /// The projection matrix.
    Projection = 0,

    /// The texture coordinate transform.
    TextureMatrix = 1,

    /// The texture unit to sample from.
    Sampler = 2,

    /// The flat fill color.
    Color = 3,

    /// The whole-layer alpha scale.
    PlaneAlpha = 4,

    /// The color correction matrix.
    ColorMatrix = 5,

    /// The distortion polynomial coefficients.
    DistortParams = 6,

    /// The first-view transform.
    ViewTransform1 = 7,

    /// The second-view transform.
    ViewTransform2 = 8,
}

impl Uniform {
    fn as_index(self) -> usize {
        self as usize
    }

    fn as_name(self) -> &'static str {
        match self {
            Uniform::Projection => names::PROJECTION,
            Uniform::TextureMatrix => names::TEXTURE_MATRIX,
            Uniform::Sampler => names::SAMPLER,
            Uniform::Color => names::COLOR,
            Uniform::PlaneAlpha => names::ALPHA_PLANE,
            Uniform::ColorMatrix => names::COLOR_MATRIX,
            Uniform::DistortParams => names::DISTORT_PARAMS,
            Uniform::ViewTransform1 => names::VIEW_TRANSFORM_1,
            Uniform::ViewTransform2 => names::VIEW_TRANSFORM_2,
        }
    }
}

const UNIFORM_COUNT: usize = 9;
const UNIFORMS: [Uniform; UNIFORM_COUNT] = [
    Uniform::Projection,
    Uniform::TextureMatrix,
    Uniform::Sampler,
    Uniform::Color,
    Uniform::PlaneAlpha,
    Uniform::ColorMatrix,
    Uniform::DistortParams,
    Uniform::ViewTransform1,
    Uniform::ViewTransform2,
];

use Uniform::*;

/// Stands in for missing distortion coefficients; the polynomial evaluates
/// to one everywhere.
const IDENTITY_DISTORTION: Vec4 = Vec4::new(1.0, 0.0, 0.0, 0.0);

/// A [`glow`] context that can build and bind layer programs.
pub struct GlowContext<H: HasContext + ?Sized> {
    /// The underlying context.
    context: H,
}

impl<H: HasContext + ?Sized> GlowContext<H> {
    /// Wrap a [`glow`] context.
    ///
    /// # Safety
    ///
    /// The context must be current, and must still be current whenever a
    /// cache compiles or binds through this value.
    pub unsafe fn new(context: H) -> Self
    where
        H: Sized,
    {
        GlowContext { context }
    }

    /// Get a reference to the underlying context.
    pub fn context(&self) -> &H {
        &self.context
    }

    /// Get a mutable reference to the underlying context.
    pub fn context_mut(&mut self) -> &mut H {
        &mut self.context
    }
}

/// A compiled and linked program, plus where its uniforms live.
///
/// Programs live as long as the cache that owns them; nothing deletes the GL
/// object on drop, since the context is not reachable from here.
pub struct GlowProgram<H: HasContext + ?Sized> {
    /// The linked program object.
    raw: H::Program,

    /// One location per [`Uniform`], in table order.
    ///
    /// A variant that does not declare some uniform gets `None` there and is
    /// skipped at bind time.
    uniforms: Box<[Option<H::UniformLocation>]>,
}

impl<H: HasContext + ?Sized> GlowProgram<H> {
    fn uniform(&self, uniform: Uniform) -> Option<&H::UniformLocation> {
        self.uniforms[uniform.as_index()].as_ref()
    }

    /// The raw program object, for callers that set up vertex attributes or
    /// otherwise talk to GL directly.
    pub fn raw(&self) -> &H::Program {
        &self.raw
    }
}

impl<H: HasContext + ?Sized> fmt::Debug for GlowProgram<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowProgram")
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}

/// An error reported by the OpenGL driver.
#[derive(Debug)]
pub struct GlError(String);

impl From<String> for GlError {
    fn from(s: String) -> Self {
        GlError(s)
    }
}

impl fmt::Display for GlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gl error: {}", self.0)
    }
}

impl std::error::Error for GlError {}

impl<H: HasContext + ?Sized> GpuContext for GlowContext<H> {
    type Program = GlowProgram<H>;
    type Error = GlError;

    fn compile_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self::Program, Self::Error> {
        let raw = compile_program(&self.context, vertex_source, fragment_source)?;

        // A missing location just means the variant never declared the
        // uniform.
        let uniforms = UNIFORMS
            .iter()
            .map(|uniform| unsafe { self.context.get_uniform_location(raw, uniform.as_name()) })
            .collect::<Box<[_]>>();

        Ok(GlowProgram { raw, uniforms })
    }

    fn bind_program(
        &mut self,
        program: &Self::Program,
        description: &Description,
    ) -> Result<(), Self::Error> {
        unsafe {
            self.context.use_program(Some(program.raw));

            if let Some(location) = program.uniform(Projection) {
                self.context.uniform_matrix_4_f32_slice(
                    Some(location),
                    false,
                    &description.projection.to_cols_array(),
                );
            }
            if let Some(location) = program.uniform(TextureMatrix) {
                self.context.uniform_matrix_4_f32_slice(
                    Some(location),
                    false,
                    &description.texture_matrix.to_cols_array(),
                );
            }
            if let (Some(location), Some(texture)) =
                (program.uniform(Sampler), &description.texture)
            {
                self.context
                    .uniform_1_i32(Some(location), texture.unit as i32);
            }
            if let Some(location) = program.uniform(Color) {
                let color = description.color;
                self.context
                    .uniform_4_f32(Some(location), color.x, color.y, color.z, color.w);
            }
            if let Some(location) = program.uniform(PlaneAlpha) {
                self.context
                    .uniform_1_f32(Some(location), description.plane_alpha);
            }
            if let (Some(location), Some(matrix)) =
                (program.uniform(ColorMatrix), description.color_matrix)
            {
                self.context.uniform_matrix_4_f32_slice(
                    Some(location),
                    false,
                    &matrix.to_cols_array(),
                );
            }
            if let (Some(location), Some(stereo)) =
                (program.uniform(ViewTransform1), &description.stereo)
            {
                self.context.uniform_matrix_3_f32_slice(
                    Some(location),
                    false,
                    &stereo.transforms[0].to_cols_array(),
                );
            }
            if let (Some(location), Some(stereo)) =
                (program.uniform(ViewTransform2), &description.stereo)
            {
                self.context.uniform_matrix_3_f32_slice(
                    Some(location),
                    false,
                    &stereo.transforms[1].to_cols_array(),
                );
            }
            if let Some(location) = program.uniform(DistortParams) {
                let params = description.distortion.unwrap_or(IDENTITY_DISTORTION);
                self.context
                    .uniform_4_f32(Some(location), params.x, params.y, params.z, params.w);
            }

            gl_error(&self.context);
        }

        Ok(())
    }
}

fn compile_program<H: HasContext + ?Sized>(
    context: &H,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<H::Program, GlError> {
    unsafe {
        let vertex_shader = compile_shader(context, glow::VERTEX_SHADER, vertex_source)?;
        let fragment_shader = compile_shader(context, glow::FRAGMENT_SHADER, fragment_source)?;

        let program = context.create_program().gl_err()?;
        let _call_on_drop = CallOnDrop(|| context.delete_program(program));

        context.attach_shader(program, vertex_shader);
        context.attach_shader(program, fragment_shader);
        let _unlink_shaders = CallOnDrop(|| {
            context.detach_shader(program, vertex_shader);
            context.detach_shader(program, fragment_shader);
            context.delete_shader(vertex_shader);
            context.delete_shader(fragment_shader);
        });
        context.link_program(program);

        if !context.get_program_link_status(program) {
            let log = context.get_program_info_log(program);
            return Err(GlError(format!("link: {log}")));
        }

        mem::forget(_call_on_drop);
        Ok(program)
    }
}

unsafe fn compile_shader<H: HasContext + ?Sized>(
    context: &H,
    shader_type: u32,
    source: &str,
) -> Result<H::Shader, GlError> {
    let shader = context.create_shader(shader_type).gl_err()?;
    let _call_on_drop = CallOnDrop(|| context.delete_shader(shader));

    context.shader_source(shader, source);
    context.compile_shader(shader);

    if !context.get_shader_compile_status(shader) {
        let log = context.get_shader_info_log(shader);
        let stage = if shader_type == glow::VERTEX_SHADER {
            "vertex"
        } else {
            "fragment"
        };
        return Err(GlError(format!("{stage} shader: {log}")));
    }

    mem::forget(_call_on_drop);
    Ok(shader)
}

fn gl_error(h: &(impl HasContext + ?Sized)) {
    let err = unsafe { h.get_error() };

    if err != glow::NO_ERROR {
        let error_str = match err {
            glow::INVALID_ENUM => "GL_INVALID_ENUM",
            glow::INVALID_VALUE => "GL_INVALID_VALUE",
            glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
            glow::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
            glow::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
            glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
            glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
            glow::CONTEXT_LOST => "GL_CONTEXT_LOST",
            _ => "Unknown GL error",
        };

        tracing::error!("GL error: {}", error_str)
    }
}

trait ResultExt<T, E> {
    fn gl_err(self) -> Result<T, GlError>;
}

impl<T, E: Into<GlError>> ResultExt<T, E> for Result<T, E> {
    fn gl_err(self) -> Result<T, GlError> {
        self.map_err(Into::into)
    }
}

struct CallOnDrop<F: FnMut()>(F);

impl<F: FnMut()> Drop for CallOnDrop<F> {
    fn drop(&mut self) {
        (self.0)();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use layer_shade::{generate_fragment_shader, generate_vertex_shader, ShaderKey};

    fn declared_uniforms(source: &str) -> Vec<&str> {
        source
            .lines()
            .filter_map(|line| line.trim().strip_prefix("uniform "))
            .filter_map(|declaration| declaration.split_whitespace().nth(1))
            .map(|name| name.trim_end_matches(';'))
            .collect()
    }

    #[test]
    fn uniform_indices_match_the_table() {
        assert_eq!(UNIFORMS.len(), UNIFORM_COUNT);
        for (index, uniform) in UNIFORMS.iter().enumerate() {
            assert_eq!(uniform.as_index(), index);
        }
    }

    #[test]
    fn every_generated_uniform_has_a_table_slot() {
        for key in ShaderKey::all() {
            for source in [generate_vertex_shader(key), generate_fragment_shader(key)] {
                for name in declared_uniforms(&source) {
                    assert!(
                        UNIFORMS.iter().any(|uniform| uniform.as_name() == name),
                        "no location slot for uniform {name} in {key:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn every_table_slot_is_declared_by_some_variant() {
        let mut seen = [false; UNIFORM_COUNT];

        for key in ShaderKey::all() {
            for source in [generate_vertex_shader(key), generate_fragment_shader(key)] {
                for name in declared_uniforms(&source) {
                    if let Some(index) =
                        UNIFORMS.iter().position(|uniform| uniform.as_name() == name)
                    {
                        seen[index] = true;
                    }
                }
            }
        }

        for (uniform, seen) in UNIFORMS.iter().zip(seen) {
            assert!(seen, "{} is never declared by any variant", uniform.as_name());
        }
    }
}
