use keymap::KeyMap;

#[derive(KeyMap, Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Quit the application
    #[key("q")]
    Quit,
    /// Restart the current machine on the current input
    #[key("r")]
    Reset,
    /// Apply one transition
    #[key("space")]
    Step,
    /// Toggle auto-play
    #[key("p")]
    ToggleAutoPlay,
    /// Toggle help display
    #[key("h")]
    ToggleHelp,
    /// Select the previous catalog machine
    #[key("left")]
    PreviousMachine,
    /// Select the next catalog machine
    #[key("right")]
    NextMachine,
    /// Load the previous example input
    #[key("up")]
    PreviousExample,
    /// Load the next example input
    #[key("down")]
    NextExample,
    /// Type a new input string
    #[key("e")]
    EditInput,
    /// Shorten the auto-play delay
    #[key("f")]
    Faster,
    /// Lengthen the auto-play delay
    #[key("s")]
    Slower,
}
