use std::ffi::c_void;

use super::{EngineError, ProcResolver};
use crate::host::RenderTarget;

/// Graphics API the engine renders with.
///
/// Only OpenGL is wired today; the tag exists so parameter lists stay
/// self-describing when further APIs are added.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderApiType {
    OpenGl,
}

/// One tagged entry of a [`RenderParamList`].
#[derive(Debug, Clone)]
pub enum RenderParam {
    /// Graphics API selector. First entry of every creation list.
    ApiType(RenderApiType),
    /// Proc-address resolver the engine initializes its API loader with.
    InitParams(ProcResolver),
    /// Enables manual driving of the engine's render loop by the host.
    AdvancedControl(bool),
    /// Requested gpu backend (e.g. "gpu-next"). Engines without runtime
    /// backend selection treat this as a hint.
    BackendName(String),
    /// Native X11 display connection, present only on hosts that expose one.
    X11Display(*mut c_void),
    /// Render destination for one frame.
    Target(RenderTarget),
    /// Vertical flip selector for the render pass.
    FlipY(bool),
    /// List terminator.
    Invalid,
}

/// Ordered, sentinel-terminated parameter list.
///
/// Entry order is significant and fixed by the engine's contract. Creation
/// lists carry, in order: API type, init params, advanced control, backend
/// name, then optionally the platform display. Render lists carry the target
/// descriptor and the flip flag. `finish` seals the list with the sentinel.
#[derive(Debug, Clone, Default)]
pub struct RenderParamList {
    entries: Vec<RenderParam>,
}

impl RenderParamList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, preserving order.
    ///
    /// Entries pushed after the sentinel are dropped with a warning; the
    /// engine never sees past the terminator anyway.
    pub fn push(&mut self, param: RenderParam) {
        if self.is_terminated() {
            log::warn!("ignoring render parameter pushed after the sentinel: {param:?}");
            return;
        }
        self.entries.push(param);
    }

    /// Seals the list with the sentinel entry. Idempotent.
    pub fn finish(mut self) -> Self {
        if !self.is_terminated() {
            self.entries.push(RenderParam::Invalid);
        }
        self
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.entries.last(), Some(RenderParam::Invalid))
    }

    /// All entries in push order, sentinel included once sealed.
    pub fn entries(&self) -> &[RenderParam] {
        &self.entries
    }

    pub fn api_type(&self) -> Option<RenderApiType> {
        self.entries.iter().find_map(|p| match p {
            RenderParam::ApiType(api) => Some(*api),
            _ => None,
        })
    }

    pub fn proc_resolver(&self) -> Option<ProcResolver> {
        self.entries.iter().find_map(|p| match p {
            RenderParam::InitParams(resolver) => Some(*resolver),
            _ => None,
        })
    }

    pub fn advanced_control(&self) -> Option<bool> {
        self.entries.iter().find_map(|p| match p {
            RenderParam::AdvancedControl(on) => Some(*on),
            _ => None,
        })
    }

    pub fn backend_name(&self) -> Option<&str> {
        self.entries.iter().find_map(|p| match p {
            RenderParam::BackendName(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn x11_display(&self) -> Option<*mut c_void> {
        self.entries.iter().find_map(|p| match p {
            RenderParam::X11Display(display) => Some(*display),
            _ => None,
        })
    }

    pub fn target(&self) -> Option<RenderTarget> {
        self.entries.iter().find_map(|p| match p {
            RenderParam::Target(target) => Some(*target),
            _ => None,
        })
    }

    pub fn flip_y(&self) -> Option<bool> {
        self.entries.iter().find_map(|p| match p {
            RenderParam::FlipY(flip) => Some(*flip),
            _ => None,
        })
    }

    /// Checks this list against the creation contract and extracts its
    /// entries.
    ///
    /// A creation list must be sentinel-terminated and carry each entry at
    /// most once, in contract order; API type and init params are mandatory,
    /// the rest optional. Render-time entries do not belong here. Engines
    /// call this instead of re-walking the raw entries and surface the
    /// [`EngineError`] unchanged.
    pub fn creation_spec(&self) -> Result<CreationSpec<'_>, EngineError> {
        if !self.is_terminated() {
            return Err(EngineError::BadParamList {
                reason: "missing sentinel terminator",
            });
        }

        let mut api = None;
        let mut resolver = None;
        let mut advanced_control = None;
        let mut backend = None;
        let mut x11_display = None;

        let mut prev_rank: Option<u8> = None;
        for entry in &self.entries {
            let rank = creation_rank(entry).ok_or(EngineError::BadParamList {
                reason: "render-time entry in creation list",
            })?;
            if prev_rank.is_some_and(|prev| rank <= prev) {
                return Err(EngineError::BadParamList {
                    reason: "entries out of contract order",
                });
            }
            prev_rank = Some(rank);

            match entry {
                RenderParam::ApiType(kind) => api = Some(*kind),
                RenderParam::InitParams(r) => resolver = Some(*r),
                RenderParam::AdvancedControl(on) => advanced_control = Some(*on),
                RenderParam::BackendName(name) => backend = Some(name.as_str()),
                RenderParam::X11Display(display) => x11_display = Some(*display),
                RenderParam::Target(_) | RenderParam::FlipY(_) | RenderParam::Invalid => {}
            }
        }

        let api = api.ok_or(EngineError::BadParamList {
            reason: "missing api-type entry",
        })?;
        let resolver = resolver.ok_or(EngineError::BadParamList {
            reason: "missing init-params entry",
        })?;

        Ok(CreationSpec {
            api,
            resolver,
            advanced_control,
            backend,
            x11_display,
        })
    }
}

/// Creation entries extracted from a contract-checked parameter list.
///
/// Borrowed view produced by [`RenderParamList::creation_spec`].
#[derive(Debug, Copy, Clone)]
pub struct CreationSpec<'a> {
    pub api: RenderApiType,
    pub resolver: ProcResolver,
    pub advanced_control: Option<bool>,
    pub backend: Option<&'a str>,
    pub x11_display: Option<*mut c_void>,
}

fn creation_rank(param: &RenderParam) -> Option<u8> {
    match param {
        RenderParam::ApiType(_) => Some(0),
        RenderParam::InitParams(_) => Some(1),
        RenderParam::AdvancedControl(_) => Some(2),
        RenderParam::BackendName(_) => Some(3),
        RenderParam::X11Display(_) => Some(4),
        RenderParam::Invalid => Some(5),
        RenderParam::Target(_) | RenderParam::FlipY(_) => None,
    }
}
