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

//! Assembles shader source text.

use std::mem;

/// Covers the largest variant we generate, so the common case never
/// reallocates.
const SOURCE_CAPACITY: usize = 1024;

/// An append-only builder for generated GLSL.
///
/// Every appended line is prefixed with the current indentation and
/// terminated, so the generator code reads roughly like the source it emits.
/// This is purely a formatting aid; it knows nothing about GLSL.
#[derive(Debug)]
pub(crate) struct SourceBuilder {
    /// The accumulated source text.
    source: String,

    /// The current depth in block levels.
    indent: usize,
}

impl SourceBuilder {
    pub(crate) fn new() -> Self {
        SourceBuilder {
            source: String::with_capacity(SOURCE_CAPACITY),
            indent: 0,
        }
    }

    /// Append one line at the current indentation.
    pub(crate) fn line(&mut self, line: &str) -> &mut Self {
        for _ in 0..self.indent {
            self.source.push_str("    ");
        }
        self.source.push_str(line);
        self.source.push('\n');
        self
    }

    /// Indent everything that follows by one more level.
    pub(crate) fn enter_block(&mut self) -> &mut Self {
        self.indent += 1;
        self
    }

    /// Undo one [`enter_block`](Self::enter_block).
    pub(crate) fn leave_block(&mut self) -> &mut Self {
        assert!(self.indent > 0, "unbalanced leave_block");
        self.indent -= 1;
        self
    }

    /// Take the accumulated source, leaving the builder empty.
    pub(crate) fn finish(&mut self) -> String {
        self.indent = 0;
        mem::take(&mut self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_terminated() {
        let mut builder = SourceBuilder::new();
        builder.line("precision mediump float;");

        assert_eq!(builder.finish(), "precision mediump float;\n");
    }

    #[test]
    fn blocks_indent_by_four_spaces() {
        let mut builder = SourceBuilder::new();
        builder
            .line("void main(void) {")
            .enter_block()
            .line("gl_FragColor = color;")
            .enter_block()
            .line("deeper();")
            .leave_block()
            .line("shallower();")
            .leave_block()
            .line("}");

        assert_eq!(
            builder.finish(),
            concat!(
                "void main(void) {\n",
                "    gl_FragColor = color;\n",
                "        deeper();\n",
                "    shallower();\n",
                "}\n",
            )
        );
    }

    #[test]
    #[should_panic(expected = "unbalanced leave_block")]
    fn leaving_an_unentered_block_panics() {
        SourceBuilder::new().leave_block();
    }

    #[test]
    fn finish_resets_the_builder() {
        let mut builder = SourceBuilder::new();
        builder.line("void first() {").enter_block();
        builder.finish();

        builder.line("second;");
        assert_eq!(builder.finish(), "second;\n");
    }
}
