//! Interception of mutating capabilities.
//!
//! Every mutator the program calls goes through the same protocol:
//! run the real world operation, refresh the visualization, then block for
//! the pacing delay. Queries are never intercepted; they must stay free of
//! side effects and lag so programs can call them in tight loops.
//!
//! The visualization hook and the world are passed in explicitly; the
//! interceptor owns no hidden state, so it is testable with a recording
//! [`WorldView`] double.

use crate::{SharedView, SharedWorld};
use karel_world::{Color, KarelError, World, MAX_SPEED};
use mlua::Lua;
use std::time::Duration;

/// Visualization side-effect hook, invoked after every successful
/// mutating capability call.
pub trait WorldView: Send {
    fn refresh(&mut self, world: &World);
}

/// A view that draws nothing. Useful for headless runs and tests.
#[derive(Debug, Default)]
pub struct NullView;

impl WorldView for NullView {
    fn refresh(&mut self, _world: &World) {}
}

/// Delay applied after each mutating call: `1 - speed/100` seconds.
///
/// Speed 100 means no delay, speed 0 roughly one second. Pure function of
/// the speed read at call time; a mid-run speed change takes effect on the
/// next call.
#[must_use]
pub fn pacing_delay(speed: u8) -> Duration {
    let speed = speed.min(MAX_SPEED);
    Duration::from_secs_f64(1.0 - f64::from(speed) / f64::from(MAX_SPEED))
}

/// Binds a zero-argument mutator as an intercepted global.
pub(crate) fn bind_intercepted_action(
    lua: &Lua,
    name: &str,
    world: &SharedWorld,
    view: &SharedView,
    action: fn(&mut World) -> Result<(), KarelError>,
) -> mlua::Result<()> {
    let world = SharedWorld::clone(world);
    let view = SharedView::clone(view);
    let wrapped = lua.create_function(move |_, ()| {
        let mut w = world.lock();
        action(&mut w).map_err(mlua::Error::external)?;
        view.lock().refresh(&w);
        let delay = pacing_delay(w.speed());
        drop(w);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        Ok(())
    })?;
    lua.globals().set(name, wrapped)
}

/// Binds `paint_corner(color)` as an intercepted global.
///
/// The color string is parsed before the world is touched; an unknown
/// color surfaces as a domain error at the call site.
pub(crate) fn bind_intercepted_paint(
    lua: &Lua,
    name: &str,
    world: &SharedWorld,
    view: &SharedView,
) -> mlua::Result<()> {
    let world = SharedWorld::clone(world);
    let view = SharedView::clone(view);
    let wrapped = lua.create_function(move |_, color: String| {
        let color: Color = color.parse().map_err(mlua::Error::external)?;
        let mut w = world.lock();
        w.paint_corner(color).map_err(mlua::Error::external)?;
        view.lock().refresh(&w);
        let delay = pacing_delay(w.speed());
        drop(w);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        Ok(())
    })?;
    lua.globals().set(name, wrapped)
}
