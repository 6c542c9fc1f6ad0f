//! InputSequencer: replays controller input over a [`ConsoleLink`].
//!
//! # How a macro runs (for beginners)
//!
//! 1. The macro string is parsed *completely* by
//!    [`sysbot_core::parse_macro`].  A bad token anywhere means nothing is
//!    sent at all.
//! 2. Each step is then executed in order.  Button and stick steps become one
//!    wire command each; wait steps pause locally with `tokio::time::sleep`
//!    and send nothing.
//! 3. The first step whose command cannot be sent aborts the rest and is
//!    reported as [`InputError::StepFailed`], naming the step.
//!
//! The sequencer remembers which buttons are held and where each stick sits
//! so [`InputSequencer::reset_inputs`] can put the controller back to rest
//! after an aborted macro.

use std::collections::BTreeSet;
use std::time::Duration;

use sysbot_core::{
    parse_macro, Button, RangeError, SequenceError, SequenceStep, StickName, StickVector,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::console::{ConsoleLink, TransportError};

/// Errors produced by the input sequencer.
#[derive(Debug, Error)]
pub enum InputError {
    /// The macro did not parse; nothing was sent.
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// A stick value was outside the signed 16-bit range; nothing was sent.
    #[error(transparent)]
    Range(#[from] RangeError),

    /// A step could not be sent; the remaining steps were skipped.
    #[error("step {step} ({token}) failed: {source}")]
    StepFailed {
        step: usize,
        token: String,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Replays input steps and tracks the resulting controller state.
pub struct InputSequencer<'a, L: ConsoleLink + ?Sized> {
    link: &'a mut L,
    held: BTreeSet<Button>,
    left_stick: StickVector,
    right_stick: StickVector,
}

impl<'a, L: ConsoleLink + ?Sized> InputSequencer<'a, L> {
    /// Creates a sequencer assuming the controller starts at rest.
    pub fn new(link: &'a mut L) -> Self {
        Self {
            link,
            held: BTreeSet::new(),
            left_stick: StickVector::NEUTRAL,
            right_stick: StickVector::NEUTRAL,
        }
    }

    /// Buttons currently held by `+BUTTON` steps or [`Self::press`].
    pub fn held_buttons(&self) -> impl Iterator<Item = Button> + '_ {
        self.held.iter().copied()
    }

    /// Last deflection sent for `stick`.
    pub fn stick_position(&self, stick: StickName) -> StickVector {
        match stick {
            StickName::Left => self.left_stick,
            StickName::Right => self.right_stick,
        }
    }

    // ── Macros ────────────────────────────────────────────────────────────────

    /// Parses `text` and replays it.  Returns the number of steps executed.
    ///
    /// # Errors
    ///
    /// - [`InputError::Sequence`] if the macro does not parse (zero steps ran).
    /// - [`InputError::StepFailed`] if a step could not be sent.
    pub async fn run_macro(&mut self, text: &str) -> Result<usize, InputError> {
        let steps = parse_macro(text)?;
        self.replay(&steps).await
    }

    /// Replays already-parsed steps in order.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::StepFailed`] for the first step that could not be
    /// sent; later steps are not executed.
    pub async fn replay(&mut self, steps: &[SequenceStep]) -> Result<usize, InputError> {
        info!("replaying {} input steps", steps.len());

        for (index, step) in steps.iter().enumerate() {
            if let Some(pause) = step.wait_duration() {
                debug!("step {index}: waiting {pause:?}");
                tokio::time::sleep(pause).await;
                continue;
            }

            if let Err(source) = self.apply(step).await {
                warn!("step {index} ({step}) failed: {source}");
                return Err(InputError::StepFailed {
                    step: index,
                    token: step.to_string(),
                    source,
                });
            }
        }

        Ok(steps.len())
    }

    async fn apply(&mut self, step: &SequenceStep) -> Result<(), TransportError> {
        let Some(command) = step.to_command() else {
            return Ok(());
        };
        self.link.send_command(&command).await?;

        match *step {
            SequenceStep::Hold(button) => {
                self.held.insert(button);
            }
            SequenceStep::Release(button) => {
                self.held.remove(&button);
            }
            SequenceStep::SetLeftStick(v) => self.left_stick = v,
            SequenceStep::SetRightStick(v) => self.right_stick = v,
            SequenceStep::PressAndRelease(_) | SequenceStep::Wait(_) => {}
        }
        Ok(())
    }

    // ── Single inputs ─────────────────────────────────────────────────────────

    /// Presses and holds `button`.
    pub async fn press(&mut self, button: Button) -> Result<(), TransportError> {
        self.apply(&SequenceStep::Hold(button)).await
    }

    /// Releases `button`.
    pub async fn release(&mut self, button: Button) -> Result<(), TransportError> {
        self.apply(&SequenceStep::Release(button)).await
    }

    /// Presses and releases `button`; the peer times the hold.
    pub async fn click(&mut self, button: Button) -> Result<(), TransportError> {
        self.apply(&SequenceStep::PressAndRelease(button)).await
    }

    /// Deflects `stick` to `(x, y)`.
    ///
    /// Values are checked before anything is sent; they are never clamped.
    ///
    /// # Errors
    ///
    /// - [`InputError::Range`] if either axis is outside `[-32768, 32767]`.
    /// - [`InputError::Transport`] if the command could not be sent.
    pub async fn set_stick(&mut self, stick: StickName, x: i64, y: i64) -> Result<(), InputError> {
        let vector = StickVector::try_new(x, y)?;
        self.set_stick_vector(stick, vector).await?;
        Ok(())
    }

    /// Deflects `stick` to an already-validated vector.
    pub async fn set_stick_vector(
        &mut self,
        stick: StickName,
        vector: StickVector,
    ) -> Result<(), TransportError> {
        let step = match stick {
            StickName::Left => SequenceStep::SetLeftStick(vector),
            StickName::Right => SequenceStep::SetRightStick(vector),
        };
        self.apply(&step).await
    }

    /// Holds `stick` at `vector` for `hold`, then returns it to neutral.
    ///
    /// The neutral command is sent even if the hold was interrupted by an
    /// error, so the stick is not left deflected.
    ///
    /// # Errors
    ///
    /// Returns the first transport error encountered.
    pub async fn deflect_stick_for(
        &mut self,
        stick: StickName,
        vector: StickVector,
        hold: Duration,
    ) -> Result<(), TransportError> {
        let deflected = self.set_stick_vector(stick, vector).await;
        if deflected.is_ok() {
            tokio::time::sleep(hold).await;
        }
        let neutral = self.set_stick_vector(stick, StickVector::NEUTRAL).await;
        deflected.and(neutral)
    }

    /// Releases every held button and centres both sticks.
    ///
    /// Every release is attempted even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first transport error encountered.
    pub async fn reset_inputs(&mut self) -> Result<(), TransportError> {
        let mut first_error = None;

        let held: Vec<Button> = self.held.iter().copied().collect();
        for button in held {
            if let Err(e) = self.release(button).await {
                warn!("reset: release {button} failed: {e}");
                first_error.get_or_insert(e);
            }
        }

        for stick in [StickName::Left, StickName::Right] {
            if self.stick_position(stick).is_neutral() {
                continue;
            }
            if let Err(e) = self.set_stick_vector(stick, StickVector::NEUTRAL).await {
                warn!("reset: centring {stick} stick failed: {e}");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
