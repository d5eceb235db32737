//! Capability vocabulary binding.
//!
//! The vocabulary names are reserved words of the domain: binding always
//! overwrites whatever the program holds under those names. Two passes
//! exist, per the host protocol:
//!
//! 1. **Raw pass** — before the primary chunk executes, every name is
//!    bound straight to the world model so top-level calls resolve.
//! 2. **Intercept pass** — after loading, the mutating subset is rebound
//!    to intercepted variants (visualization refresh + pacing delay) and
//!    the full vocabulary is re-asserted, replacing any definitions the
//!    program made under reserved names.
//!
//! All units of a loaded program share one global environment, so binding
//! the VM once covers the primary unit and every dependency unit.

use crate::intercept::{bind_intercepted_action, bind_intercepted_paint};
use crate::{SharedView, SharedWorld};
use karel_world::{Color, Direction, KarelError, World};
use mlua::{Lua, Value};

/// Every capability name, movers and mutators first, then queries.
pub const VOCABULARY: &[&str] = &[
    "move",
    "turn_left",
    "pick_beeper",
    "put_beeper",
    "paint_corner",
    "facing_north",
    "facing_south",
    "facing_east",
    "facing_west",
    "not_facing_north",
    "not_facing_south",
    "not_facing_east",
    "not_facing_west",
    "front_is_clear",
    "front_is_blocked",
    "left_is_clear",
    "left_is_blocked",
    "right_is_clear",
    "right_is_blocked",
    "beepers_present",
    "no_beepers_present",
    "beepers_in_bag",
    "no_beepers_in_bag",
    "corner_color_is",
];

/// The mutating subset: these get the interception treatment.
pub const MUTATORS: &[&str] = &[
    "move",
    "turn_left",
    "pick_beeper",
    "put_beeper",
    "paint_corner",
];

/// Binds the whole vocabulary directly to the world model, no
/// interception. Overwrites existing globals of the same names.
pub(crate) fn bind_raw(lua: &Lua, world: &SharedWorld) -> mlua::Result<()> {
    bind_action(lua, "move", world, World::move_forward)?;
    bind_action(lua, "turn_left", world, World::turn_left)?;
    bind_action(lua, "pick_beeper", world, World::pick_beeper)?;
    bind_action(lua, "put_beeper", world, World::put_beeper)?;
    bind_raw_paint(lua, "paint_corner", world)?;

    bind_query(lua, "facing_north", world, |w| w.facing() == Direction::North)?;
    bind_query(lua, "facing_south", world, |w| w.facing() == Direction::South)?;
    bind_query(lua, "facing_east", world, |w| w.facing() == Direction::East)?;
    bind_query(lua, "facing_west", world, |w| w.facing() == Direction::West)?;
    bind_query(lua, "not_facing_north", world, |w| {
        w.facing() != Direction::North
    })?;
    bind_query(lua, "not_facing_south", world, |w| {
        w.facing() != Direction::South
    })?;
    bind_query(lua, "not_facing_east", world, |w| {
        w.facing() != Direction::East
    })?;
    bind_query(lua, "not_facing_west", world, |w| {
        w.facing() != Direction::West
    })?;
    bind_query(lua, "front_is_clear", world, World::front_is_clear)?;
    bind_query(lua, "front_is_blocked", world, |w| !w.front_is_clear())?;
    bind_query(lua, "left_is_clear", world, World::left_is_clear)?;
    bind_query(lua, "left_is_blocked", world, |w| !w.left_is_clear())?;
    bind_query(lua, "right_is_clear", world, World::right_is_clear)?;
    bind_query(lua, "right_is_blocked", world, |w| !w.right_is_clear())?;
    bind_query(lua, "beepers_present", world, World::beepers_present)?;
    bind_query(lua, "no_beepers_present", world, |w| !w.beepers_present())?;
    bind_query(lua, "beepers_in_bag", world, World::beepers_in_bag)?;
    bind_query(lua, "no_beepers_in_bag", world, |w| !w.beepers_in_bag())?;
    bind_color_query(lua, "corner_color_is", world)?;

    Ok(())
}

/// Rebinds the mutating subset to intercepted variants.
pub(crate) fn bind_intercepted(
    lua: &Lua,
    world: &SharedWorld,
    view: &SharedView,
) -> mlua::Result<()> {
    bind_intercepted_action(lua, "move", world, view, World::move_forward)?;
    bind_intercepted_action(lua, "turn_left", world, view, World::turn_left)?;
    bind_intercepted_action(lua, "pick_beeper", world, view, World::pick_beeper)?;
    bind_intercepted_action(lua, "put_beeper", world, view, World::put_beeper)?;
    bind_intercepted_paint(lua, "paint_corner", world, view)?;
    Ok(())
}

/// Installs a strict-globals metatable: reading an undefined global raises
/// a recognizable `unresolved name` error the supervisor classifies.
///
/// Installed after binding, so every vocabulary name and every name the
/// program defined resolves normally; only genuinely undefined names trip.
pub(crate) fn install_strict_globals(lua: &Lua) -> mlua::Result<()> {
    let meta = lua.create_table()?;
    let index = lua.create_function(|_, (_table, key): (Value, Value)| -> mlua::Result<Value> {
        match key {
            Value::String(name) => Err(mlua::Error::RuntimeError(format!(
                "unresolved name '{}'",
                name.to_string_lossy()
            ))),
            _ => Ok(Value::Nil),
        }
    })?;
    meta.set("__index", index)?;
    lua.globals().set_metatable(Some(meta));
    Ok(())
}

fn bind_action(
    lua: &Lua,
    name: &str,
    world: &SharedWorld,
    action: fn(&mut World) -> Result<(), KarelError>,
) -> mlua::Result<()> {
    let world = SharedWorld::clone(world);
    let f = lua.create_function(move |_, ()| {
        action(&mut world.lock()).map_err(mlua::Error::external)
    })?;
    lua.globals().set(name, f)
}

fn bind_raw_paint(lua: &Lua, name: &str, world: &SharedWorld) -> mlua::Result<()> {
    let world = SharedWorld::clone(world);
    let f = lua.create_function(move |_, color: String| {
        let color: Color = color.parse().map_err(mlua::Error::external)?;
        world.lock().paint_corner(color).map_err(mlua::Error::external)
    })?;
    lua.globals().set(name, f)
}

fn bind_query(
    lua: &Lua,
    name: &str,
    world: &SharedWorld,
    query: fn(&World) -> bool,
) -> mlua::Result<()> {
    let world = SharedWorld::clone(world);
    let f = lua.create_function(move |_, ()| Ok(query(&world.lock())))?;
    lua.globals().set(name, f)
}

fn bind_color_query(lua: &Lua, name: &str, world: &SharedWorld) -> mlua::Result<()> {
    let world = SharedWorld::clone(world);
    let f = lua.create_function(move |_, color: String| {
        let color: Color = color.parse().map_err(mlua::Error::external)?;
        Ok(world.lock().corner_color_is(color))
    })?;
    lua.globals().set(name, f)
}
