//! Host context capabilities and menu guards.
//!
//! The host's scene and window data are reached only through [`HostContext`],
//! whose queries return `None` when a capability does not exist in the
//! current context kind.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config::Settings;
use crate::id::Uid;

/// Opaque identity of a host region. Equal ids mean the same region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContextKind {
    #[default]
    Window,
    Area,
    Region,
    /// Background session without a window manager.
    Headless,
}

pub trait HostContext {
    fn kind(&self) -> ContextKind;

    fn region(&self) -> Option<RegionId> {
        None
    }

    /// Editor type of the active area, e.g. `VIEW_3D`.
    fn space_type(&self) -> Option<&str> {
        None
    }

    /// Interaction mode of the active object, e.g. `EDIT_MESH`.
    fn object_mode(&self) -> Option<&str> {
        None
    }

    fn ui_scale(&self) -> f32 {
        1.0
    }
}

/// Plain-data context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticContext {
    pub kind: ContextKind,
    pub region: Option<RegionId>,
    pub space_type: Option<String>,
    pub object_mode: Option<String>,
    pub ui_scale: Option<f32>,
}

impl StaticContext {
    pub fn for_region(region: RegionId) -> Self {
        Self {
            kind: ContextKind::Region,
            region: Some(region),
            ..Default::default()
        }
    }

    /// Takes the UI scale from the session settings.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.ui_scale = Some(settings.ui_scale);
        self
    }

    pub fn headless() -> Self {
        Self {
            kind: ContextKind::Headless,
            ..Default::default()
        }
    }
}

impl HostContext for StaticContext {
    fn kind(&self) -> ContextKind {
        self.kind
    }

    fn region(&self) -> Option<RegionId> {
        self.region
    }

    fn space_type(&self) -> Option<&str> {
        self.space_type.as_deref()
    }

    fn object_mode(&self) -> Option<&str> {
        self.object_mode.as_deref()
    }

    fn ui_scale(&self) -> f32 {
        self.ui_scale.unwrap_or(1.0)
    }
}

/// A compiled `poll_cmd` expression.
pub trait Guard {
    fn eval(&self, ctx: &dyn HostContext) -> Result<bool, String>;
}

impl<F> Guard for F
where
    F: Fn(&dyn HostContext) -> Result<bool, String>,
{
    fn eval(&self, ctx: &dyn HostContext) -> Result<bool, String> {
        self(ctx)
    }
}

pub trait GuardCompiler {
    fn compile(&self, source: &str) -> Result<Box<dyn Guard>, String>;
}

/// Understands constant guards and `space == 'X'` / `mode == 'X'` comparisons.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralGuardCompiler;

impl GuardCompiler for LiteralGuardCompiler {
    fn compile(&self, source: &str) -> Result<Box<dyn Guard>, String> {
        let expr = source.trim();
        let expr = expr.strip_prefix("return ").unwrap_or(expr).trim();
        match expr {
            "" | "True" => return Ok(Box::new(|_: &dyn HostContext| -> Result<bool, String> { Ok(true) })),
            "False" => return Ok(Box::new(|_: &dyn HostContext| -> Result<bool, String> { Ok(false) })),
            _ => {}
        }
        let (lhs, rhs) = expr
            .split_once("==")
            .ok_or_else(|| format!("unsupported guard `{expr}`"))?;
        let expected = rhs
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .to_string();
        match lhs.trim() {
            "space" => Ok(Box::new(move |ctx: &dyn HostContext| -> Result<bool, String> {
                Ok(ctx.space_type() == Some(expected.as_str()))
            })),
            "mode" => Ok(Box::new(move |ctx: &dyn HostContext| -> Result<bool, String> {
                ctx.object_mode()
                    .map(|mode| mode == expected)
                    .ok_or_else(|| "no active object".to_string())
            })),
            other => Err(format!("unknown guard operand `{other}`")),
        }
    }
}

struct CachedGuard {
    source: String,
    compiled: Option<Box<dyn Guard>>,
}

/// Compiled guards keyed by menu uid, recompiled when the source changes.
///
/// Compile and evaluation failures pass the guard.
#[derive(Default)]
pub struct GuardCache {
    guards: FxHashMap<Uid, CachedGuard>,
}

impl GuardCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(
        &mut self,
        uid: &Uid,
        source: &str,
        compiler: &dyn GuardCompiler,
        ctx: &dyn HostContext,
        debug: bool,
    ) -> bool {
        let stale = self
            .guards
            .get(uid)
            .map_or(true, |cached| cached.source != source);
        if stale {
            let compiled = match compiler.compile(source) {
                Ok(guard) => Some(guard),
                Err(e) => {
                    if debug {
                        debug!(menu = %uid, "guard compile failed: {}", e);
                    }
                    None
                }
            };
            self.guards.insert(
                uid.clone(),
                CachedGuard {
                    source: source.to_string(),
                    compiled,
                },
            );
        }
        let Some(guard) = self.guards.get(uid).and_then(|cached| cached.compiled.as_ref()) else {
            return true;
        };
        match guard.eval(ctx) {
            Ok(passed) => passed,
            Err(e) => {
                if debug {
                    debug!(menu = %uid, "guard evaluation failed: {}", e);
                }
                true
            }
        }
    }

    pub fn invalidate(&mut self, uid: &Uid) {
        self.guards.remove(uid);
    }

    pub fn clear(&mut self) {
        self.guards.clear();
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn view3d() -> StaticContext {
        StaticContext {
            space_type: Some("VIEW_3D".into()),
            object_mode: Some("OBJECT".into()),
            ..Default::default()
        }
    }

    #[test]
    fn literal_guards() {
        let compiler = LiteralGuardCompiler;
        let ctx = view3d();
        assert!(compiler.compile("return True").unwrap().eval(&ctx).unwrap());
        assert!(!compiler.compile("False").unwrap().eval(&ctx).unwrap());
        assert!(compiler.compile("space == 'VIEW_3D'").unwrap().eval(&ctx).unwrap());
        assert!(!compiler.compile("return space == \"IMAGE_EDITOR\"").unwrap().eval(&ctx).unwrap());
        assert!(compiler.compile("mode == 'OBJECT'").unwrap().eval(&ctx).unwrap());
        assert!(compiler.compile("obj.type = 'MESH'").is_err());
    }

    #[test]
    fn failures_pass_the_guard() {
        let mut cache = GuardCache::new();
        let uid = Uid::from_raw("pm_aaaaaaaa");
        let compiler = LiteralGuardCompiler;
        assert!(cache.check(&uid, "syntax error (", &compiler, &view3d(), true));
        // No active object: evaluation error.
        assert!(cache.check(&uid, "mode == 'EDIT'", &compiler, &StaticContext::default(), false));
        assert!(!cache.check(&uid, "mode == 'EDIT'", &compiler, &view3d(), false));
    }

    struct CountingCompiler(Cell<usize>);

    impl GuardCompiler for CountingCompiler {
        fn compile(&self, source: &str) -> Result<Box<dyn Guard>, String> {
            self.0.set(self.0.get() + 1);
            LiteralGuardCompiler.compile(source)
        }
    }

    #[test]
    fn compiled_once_until_source_changes() {
        let mut cache = GuardCache::new();
        let uid = Uid::from_raw("pm_aaaaaaaa");
        let compiler = CountingCompiler(Cell::new(0));
        let ctx = view3d();
        for _ in 0..3 {
            cache.check(&uid, "return True", &compiler, &ctx, false);
        }
        assert_eq!(compiler.0.get(), 1);
        cache.check(&uid, "return False", &compiler, &ctx, false);
        assert_eq!(compiler.0.get(), 2);
        cache.invalidate(&uid);
        cache.check(&uid, "return False", &compiler, &ctx, false);
        assert_eq!(compiler.0.get(), 3);
    }
}
