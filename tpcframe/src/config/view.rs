//! Contains the Trait [ViewOpt] for all view options, and the [ViewCommands] enum for the view mode

use clap::Subcommand;
/// Data views that can be generated
#[derive(Subcommand, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ViewCommands {
    /// Print every decoded hit of the time frames to stdout
    Hits,
    /// Print one line per time frame (reference BCO, window and hit counts) to stdout
    Frames,
    /// Print the GTM taggers (level-1 accepts and end-of-data) of the TPC inputs to stdout
    Gtm,
}

/// Trait for all view options set by the user.
pub trait ViewOpt {
    /// Type of View to generate.
    fn view(&self) -> Option<ViewCommands>;
}

impl<T> ViewOpt for &T
where
    T: ViewOpt,
{
    fn view(&self) -> Option<ViewCommands> {
        (*self).view()
    }
}

impl<T> ViewOpt for Box<T>
where
    T: ViewOpt,
{
    fn view(&self) -> Option<ViewCommands> {
        (**self).view()
    }
}

impl<T> ViewOpt for std::sync::Arc<T>
where
    T: ViewOpt,
{
    fn view(&self) -> Option<ViewCommands> {
        (**self).view()
    }
}
