//! Draw-engine lifecycle
//!
//! A host drives an engine through five callbacks in a fixed order:
//!
//! ```text
//! engine_init                                  (once)
//! cache_init -> cache_populate* -> cache_finish -> draw   (per frame)
//! ```
//!
//! [`EngineDriver`] owns an engine and rejects any call that breaks this
//! order, so engine implementations only ever see valid sequences.

use thiserror::Error;
use tracing::trace;

/// Callbacks of a draw engine, invoked by [`EngineDriver`]
pub trait DrawEngine {
    /// Scene object handed to `cache_populate`
    type Object;

    fn name(&self) -> &str;

    fn engine_init(&mut self);

    fn cache_init(&mut self);

    fn cache_populate(&mut self, object: &Self::Object);

    fn cache_finish(&mut self);

    fn draw(&mut self);
}

/// Where the driver is in the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    /// Initialized, between frames
    Ready,
    /// Cache open for population
    Caching,
    /// Cache finished, waiting for draw
    Cached,
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Ready => "ready",
            Phase::Caching => "caching",
            Phase::Cached => "cached",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("engine '{engine}' is already initialized")]
    AlreadyInitialized { engine: String },

    #[error("engine '{engine}': {callback} called while {phase}")]
    OutOfOrder {
        engine: String,
        callback: &'static str,
        phase: &'static str,
    },
}

pub struct EngineDriver<E: DrawEngine> {
    engine: E,
    phase: Phase,
    frames: u64,
}

impl<E: DrawEngine> EngineDriver<E> {
    pub fn new(engine: E) -> Self {
        EngineDriver {
            engine,
            phase: Phase::Uninitialized,
            frames: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of completed draws
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    pub fn engine_init(&mut self) -> Result<(), LifecycleError> {
        if self.phase != Phase::Uninitialized {
            return Err(LifecycleError::AlreadyInitialized {
                engine: self.engine.name().to_string(),
            });
        }
        self.engine.engine_init();
        self.phase = Phase::Ready;
        Ok(())
    }

    pub fn cache_init(&mut self) -> Result<(), LifecycleError> {
        self.require("cache_init", Phase::Ready)?;
        self.engine.cache_init();
        self.phase = Phase::Caching;
        Ok(())
    }

    pub fn cache_populate(&mut self, object: &E::Object) -> Result<(), LifecycleError> {
        self.require("cache_populate", Phase::Caching)?;
        self.engine.cache_populate(object);
        Ok(())
    }

    pub fn cache_finish(&mut self) -> Result<(), LifecycleError> {
        self.require("cache_finish", Phase::Caching)?;
        self.engine.cache_finish();
        self.phase = Phase::Cached;
        Ok(())
    }

    pub fn draw(&mut self) -> Result<(), LifecycleError> {
        self.require("draw", Phase::Cached)?;
        self.engine.draw();
        self.phase = Phase::Ready;
        self.frames += 1;
        trace!(engine = self.engine.name(), frame = self.frames, "drawn");
        Ok(())
    }

    /// Run one full frame over `objects`
    pub fn frame<'a>(
        &mut self,
        objects: impl IntoIterator<Item = &'a E::Object>,
    ) -> Result<(), LifecycleError>
    where
        E::Object: 'a,
    {
        self.cache_init()?;
        for object in objects {
            self.cache_populate(object)?;
        }
        self.cache_finish()?;
        self.draw()
    }

    fn require(&self, callback: &'static str, phase: Phase) -> Result<(), LifecycleError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(LifecycleError::OutOfOrder {
                engine: self.engine.name().to_string(),
                callback,
                phase: self.phase.name(),
            })
        }
    }
}
