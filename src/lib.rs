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

//! `layer-shade` generates and caches the GLSL programs a compositor uses to
//! draw layers.
//!
//! A compositor draws every layer as a textured or flat-colored quad, and
//! each combination of rendering state wants a slightly different shader:
//! sampling an external image is not the same as sampling a 2D texture,
//! premultiplied alpha scales differently from straight alpha, a color
//! correction matrix wants the pixel in linear space, and side-by-side
//! stereo output warps the lookup through a distortion polynomial. Writing
//! the whole matrix of shaders by hand does not scale, and compiling a fresh
//! program per draw is far too slow.
//!
//! This crate takes the road compositors usually take. A [`Description`] of
//! the draw is projected down to a small [`ShaderKey`] that holds only the
//! state axes that change shader *text*. The key indexes a [`ProgramCache`];
//! a miss generates the minimal vertex and fragment pair for exactly that
//! state and hands it to a [`GpuContext`] backend to compile once. Every
//! later draw with the same shape reuses the program and only refreshes its
//! uniform values, which is what [`ProgramCache::use_program`] does in one
//! call.
//!
//! The crate talks to the GPU only through the [`GpuContext`] trait. The
//! `layer-shade-glow` crate implements it for any [`glow`] context; other
//! GL-flavored APIs can plug in the same way. The generated source itself is
//! plain GLSL ES 1.00 and is available directly through
//! [`generate_vertex_shader`] and [`generate_fragment_shader`] for callers
//! that manage programs themselves.
//!
//! [`glow`]: https://crates.io/crates/glow

#![forbid(unsafe_code, rust_2018_idioms)]

mod cache;
mod description;
mod formatter;
mod generator;
mod gpu_backend;
mod key;

pub use cache::ProgramCache;
pub use description::{Description, StereoViews, TextureSource, TextureTarget};
pub use generator::{generate_fragment_shader, generate_vertex_shader, names};
pub use gpu_backend::GpuContext;
pub use key::{BlendMode, Opacity, PlaneAlpha, ShaderKey};
