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

//! Defines the GPU backend that builds and binds programs.

use crate::description::Description;

use std::error::Error;

/// The GPU interface used by the program cache.
///
/// The cache hands finished shader source to this trait and gets back an
/// opaque program object that it can later ask to bind. Implementations live
/// next to their GPU API; the `layer-shade-glow` crate provides one for any
/// [`glow`] context.
///
/// [`glow`]: https://crates.io/crates/glow
pub trait GpuContext {
    /// A compiled and linked shader program.
    type Program;

    /// The error type associated with this GPU context.
    type Error: Error + 'static;

    /// Compile and link a program from a vertex and fragment source pair.
    ///
    /// An error here means the driver rejected the source. The cache
    /// remembers the failure and will not ask about that variant again.
    fn compile_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self::Program, Self::Error>;

    /// Make the program current and push the description's uniform values.
    ///
    /// This runs once per draw. The description carries every runtime value
    /// a generated program can declare; implementations upload only those
    /// the program actually has locations for.
    fn bind_program(
        &mut self,
        program: &Self::Program,
        description: &Description,
    ) -> Result<(), Self::Error>;
}

impl<C: GpuContext + ?Sized> GpuContext for &mut C {
    type Program = C::Program;
    type Error = C::Error;

    fn compile_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self::Program, Self::Error> {
        (**self).compile_program(vertex_source, fragment_source)
    }

    fn bind_program(
        &mut self,
        program: &Self::Program,
        description: &Description,
    ) -> Result<(), Self::Error> {
        (**self).bind_program(program, description)
    }
}
