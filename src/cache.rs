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

//! Memoizes compiled programs by shader variant.

use crate::description::Description;
use crate::generator::{generate_fragment_shader, generate_vertex_shader};
use crate::gpu_backend::GpuContext;
use crate::key::ShaderKey;

use ahash::RandomState;
use hashbrown::hash_map::{Entry, HashMap};

use std::fmt;
use std::time::Instant;

/// A cache of every program the compositor has needed so far.
///
/// One of these is created at startup, owned by the caller and handed to the
/// draw loop by mutable reference; the `&mut` receivers stand in for a lock,
/// since the map has no interior synchronization.
///
/// Entries are never evicted. The key space is finite and small, so the map
/// tops out at one entry per reachable [`ShaderKey`].
pub struct ProgramCache<C: GpuContext + ?Sized> {
    /// Compiled programs, including remembered failures.
    programs: HashMap<ShaderKey, Slot<C::Program>, RandomState>,
}

/// What a lookup remembers about one key.
enum Slot<P> {
    /// The program compiled and linked.
    Compiled(P),

    /// The backend rejected the generated source. Never retried.
    Failed,
}

impl<P> Slot<P> {
    fn program(&self) -> Option<&P> {
        match self {
            Slot::Compiled(program) => Some(program),
            Slot::Failed => None,
        }
    }
}

impl<C: GpuContext + ?Sized> ProgramCache<C> {
    /// Create an empty cache.
    pub fn new() -> Self {
        ProgramCache {
            programs: HashMap::with_hasher(RandomState::new()),
        }
    }

    /// The number of variants resolved so far, failed ones included.
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Whether nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Fetch the program for a key, building it on first use.
    ///
    /// A hit returns the stored program untouched. A miss generates the
    /// vertex and fragment sources and asks the backend to build them; if
    /// the backend refuses, the failure is logged, remembered, and resolves
    /// to `None` from then on, so a bad variant costs one compile attempt
    /// for the life of the cache.
    pub fn resolve(&mut self, context: &mut C, key: ShaderKey) -> Option<&C::Program> {
        let slot = match self.programs.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let start = Instant::now();
                let vertex_source = generate_vertex_shader(key);
                let fragment_source = generate_fragment_shader(key);

                match context.compile_program(&vertex_source, &fragment_source) {
                    Ok(program) => {
                        tracing::debug!(?key, elapsed = ?start.elapsed(), "built layer program");
                        entry.insert(Slot::Compiled(program))
                    }
                    Err(error) => {
                        tracing::error!(?key, %error, "failed to build layer program");
                        entry.insert(Slot::Failed)
                    }
                }
            }
        };

        slot.program()
    }

    /// Bind the right program for a draw and push its uniform values.
    ///
    /// This is the usual entry point: project the description down to its
    /// key, resolve the program, bind it. A draw whose program failed to
    /// build is skipped without an error, since retrying source the driver
    /// already rejected cannot go better the second time.
    pub fn use_program(
        &mut self,
        context: &mut C,
        description: &Description,
    ) -> Result<(), C::Error> {
        let key = ShaderKey::for_description(description);

        if let Some(program) = self.resolve(context, key) {
            context.bind_program(program, description)?;
        }

        Ok(())
    }

    /// Build every reachable variant up front.
    ///
    /// Trades startup time for never paying a compile in the middle of a
    /// frame. Failures are remembered the same way the lazy path remembers
    /// them.
    pub fn precompile(&mut self, context: &mut C) {
        for key in ShaderKey::all() {
            let _ = self.resolve(context, key);
        }
    }
}

impl<C: GpuContext + ?Sized> Default for ProgramCache<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: GpuContext + ?Sized> fmt::Debug for ProgramCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramCache")
            .field("programs", &self.programs.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fmt;

    /// Records what the cache asks of it.
    struct FakeContext {
        compiled: usize,
        bound: Vec<u32>,
        sources: Vec<(String, String)>,
        fail: bool,
    }

    struct FakeProgram {
        id: u32,
    }

    #[derive(Debug)]
    struct FakeError;

    impl fmt::Display for FakeError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("compile rejected")
        }
    }

    impl std::error::Error for FakeError {}

    impl FakeContext {
        fn new() -> Self {
            FakeContext {
                compiled: 0,
                bound: Vec::new(),
                sources: Vec::new(),
                fail: false,
            }
        }
    }

    impl GpuContext for FakeContext {
        type Program = FakeProgram;
        type Error = FakeError;

        fn compile_program(
            &mut self,
            vertex_source: &str,
            fragment_source: &str,
        ) -> Result<FakeProgram, FakeError> {
            self.compiled += 1;
            if self.fail {
                return Err(FakeError);
            }

            self.sources
                .push((vertex_source.to_owned(), fragment_source.to_owned()));
            Ok(FakeProgram {
                id: self.compiled as u32,
            })
        }

        fn bind_program(
            &mut self,
            program: &FakeProgram,
            _description: &Description,
        ) -> Result<(), FakeError> {
            self.bound.push(program.id);
            Ok(())
        }
    }

    #[test]
    fn second_resolve_reuses_the_program() {
        let mut context = FakeContext::new();
        let mut cache = ProgramCache::new();
        let key = ShaderKey::default();

        let first = cache.resolve(&mut context, key).unwrap().id;
        let second = cache.resolve(&mut context, key).unwrap().id;

        assert_eq!(first, second);
        assert_eq!(context.compiled, 1);
        assert_eq!(context.sources.len(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_keys_build_distinct_programs() {
        let mut context = FakeContext::new();
        let mut cache = ProgramCache::new();

        let flat = ShaderKey::default();
        let stereo = ShaderKey {
            stereo: true,
            ..ShaderKey::default()
        };

        let first = cache.resolve(&mut context, flat).unwrap().id;
        let second = cache.resolve(&mut context, stereo).unwrap().id;

        assert_ne!(first, second);
        assert_eq!(context.compiled, 2);
        assert_ne!(context.sources[0], context.sources[1]);
    }

    #[test]
    fn failures_are_remembered_not_retried() {
        let mut context = FakeContext::new();
        let mut cache = ProgramCache::new();
        let key = ShaderKey::default();

        context.fail = true;
        assert!(cache.resolve(&mut context, key).is_none());
        assert!(cache.resolve(&mut context, key).is_none());
        assert_eq!(context.compiled, 1);
        assert_eq!(cache.len(), 1);

        // The slot stays failed even once the backend would succeed.
        context.fail = false;
        assert!(cache.resolve(&mut context, key).is_none());
        assert_eq!(context.compiled, 1);
    }

    #[test]
    fn use_program_compiles_once_and_binds_every_time() {
        let mut context = FakeContext::new();
        let mut cache = ProgramCache::new();
        let description = Description::default();

        cache.use_program(&mut context, &description).unwrap();
        cache.use_program(&mut context, &description).unwrap();

        assert_eq!(context.compiled, 1);
        assert_eq!(context.bound, vec![1, 1]);
    }

    #[test]
    fn descriptions_sharing_a_variant_share_a_program() {
        let mut context = FakeContext::new();
        let mut cache = ProgramCache::new();

        let faint = Description {
            plane_alpha: 0.25,
            ..Description::default()
        };
        let fainter = Description {
            plane_alpha: 0.125,
            ..Description::default()
        };

        cache.use_program(&mut context, &faint).unwrap();
        cache.use_program(&mut context, &fainter).unwrap();

        assert_eq!(context.compiled, 1);
        assert_eq!(context.bound, vec![1, 1]);
    }

    #[test]
    fn use_program_skips_draws_whose_program_failed() {
        let mut context = FakeContext::new();
        let mut cache = ProgramCache::new();

        context.fail = true;
        cache
            .use_program(&mut context, &Description::default())
            .unwrap();

        assert!(context.bound.is_empty());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn precompile_builds_every_variant() {
        let mut context = FakeContext::new();
        let mut cache = ProgramCache::new();

        cache.precompile(&mut context);

        let total = ShaderKey::all().len();
        assert_eq!(cache.len(), total);
        assert_eq!(context.compiled, total);

        // A warm cache never compiles during a draw.
        cache
            .use_program(&mut context, &Description::default())
            .unwrap();
        assert_eq!(context.compiled, total);
    }

    #[test]
    fn new_cache_is_empty() {
        let cache = ProgramCache::<FakeContext>::new();

        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
    }
}
