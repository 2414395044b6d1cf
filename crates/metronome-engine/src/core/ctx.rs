use crate::time::FrameTime;

use super::{DrawRegistry, UpdateRegistry};

/// Requests recorded by participants during one traversal.
///
/// Applied by the scheduler after the traversal returns.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub(crate) struct FrameCommands {
    pub exit: bool,
    pub suppress_draw: bool,
}

/// Per-callback context passed to `Updatable::update` and `Drawable::draw`.
///
/// Both registries are reachable so a participant can add or remove
/// participants (itself included) while it is being run; such changes take
/// effect from the next traversal.
pub struct FrameCtx<'a> {
    pub time: FrameTime,
    pub updatables: &'a UpdateRegistry,
    pub drawables: &'a DrawRegistry,
    commands: &'a mut FrameCommands,
}

impl<'a> FrameCtx<'a> {
    pub(crate) fn new(
        time: FrameTime,
        updatables: &'a UpdateRegistry,
        drawables: &'a DrawRegistry,
        commands: &'a mut FrameCommands,
    ) -> Self {
        Self {
            time,
            updatables,
            drawables,
            commands,
        }
    }

    /// Stops the loop at the end of this tick.
    ///
    /// The update steps already scheduled for this tick still run to the end
    /// of the current traversal, and this tick's draw is skipped.
    pub fn exit(&mut self) {
        self.commands.exit = true;
        self.commands.suppress_draw = true;
    }

    /// Skips the next draw pass.
    pub fn suppress_draw(&mut self) {
        self.commands.suppress_draw = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.commands.exit
    }
}
