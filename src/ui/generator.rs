use crate::{
    config::GeneratorLimits,
    error::{GalleryError, Result},
    models::{GenerationRequest, ImageSummary},
    ui::epoch::{Sequencer, Ticket},
};

pub const BLANK_PROMPT_MESSAGE: &str = "Please enter a prompt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Idle,
    Generating { ticket: Ticket },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Hidden,
    Shown,
}

/// A submitted form waiting for the service.
#[derive(Debug, Clone)]
pub struct PendingGeneration {
    pub ticket: Ticket,
    pub request: GenerationRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// Hand this summary to the page.
    Generated(ImageSummary),
    /// Shown inline; the prompt is kept.
    Failed(String),
    /// The panel was unmounted or the ticket is not the one it waits for.
    Discarded,
}

/// Prompt form with its advanced options.
#[derive(Debug, Clone)]
pub struct GeneratorPanel {
    limits: GeneratorLimits,
    prompt: String,
    width: u32,
    height: u32,
    steps: u32,
    seed: i64,
    randomize_seed: bool,
    advanced: Visibility,
    state: PanelState,
    error: Option<String>,
    tickets: Sequencer,
}

impl Default for GeneratorPanel {
    fn default() -> Self {
        Self::new(GeneratorLimits::default())
    }
}

impl GeneratorPanel {
    pub fn new(limits: GeneratorLimits) -> Self {
        Self {
            prompt: String::new(),
            width: limits.width.snap(limits.default_width),
            height: limits.height.snap(limits.default_height),
            steps: limits.steps.snap(limits.default_steps),
            seed: limits.default_seed,
            randomize_seed: limits.default_randomize_seed,
            advanced: Visibility::Hidden,
            state: PanelState::Idle,
            error: None,
            tickets: Sequencer::new(),
            limits,
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn is_generating(&self) -> bool {
        matches!(self.state, PanelState::Generating { .. })
    }

    /// Busy indicator and disabled submit control.
    pub fn show_busy(&self) -> bool {
        self.is_generating()
    }

    pub fn can_submit(&self) -> bool {
        !self.is_generating() && !self.prompt.trim().is_empty()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn prompt_len(&self) -> usize {
        self.prompt.chars().count()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn randomize_seed(&self) -> bool {
        self.randomize_seed
    }

    pub fn advanced(&self) -> Visibility {
        self.advanced
    }

    pub fn limits(&self) -> &GeneratorLimits {
        &self.limits
    }

    pub fn toggle_advanced(&mut self) {
        self.advanced = match self.advanced {
            Visibility::Hidden => Visibility::Shown,
            Visibility::Shown => Visibility::Hidden,
        };
    }

    // Inputs are disabled while a generation is running; setters return
    // whether the edit took effect.

    pub fn set_prompt(&mut self, prompt: impl Into<String>) -> bool {
        if self.is_generating() {
            return false;
        }
        self.prompt = prompt.into();
        true
    }

    pub fn set_width(&mut self, width: u32) -> bool {
        if self.is_generating() {
            return false;
        }
        self.width = self.limits.width.snap(width);
        true
    }

    pub fn set_height(&mut self, height: u32) -> bool {
        if self.is_generating() {
            return false;
        }
        self.height = self.limits.height.snap(height);
        true
    }

    pub fn set_steps(&mut self, steps: u32) -> bool {
        if self.is_generating() {
            return false;
        }
        self.steps = self.limits.steps.snap(steps);
        true
    }

    pub fn seed_editable(&self) -> bool {
        !self.is_generating() && !self.randomize_seed
    }

    pub fn set_seed(&mut self, seed: i64) -> bool {
        if !self.seed_editable() {
            return false;
        }
        self.seed = seed;
        true
    }

    pub fn set_randomize_seed(&mut self, randomize: bool) -> bool {
        if self.is_generating() {
            return false;
        }
        self.randomize_seed = randomize;
        true
    }

    /// Request built from the current form. The seed is sent even when
    /// randomized.
    pub fn request(&self) -> GenerationRequest {
        GenerationRequest::new(self.prompt.trim())
            .with_size(self.width, self.height)
            .with_steps(self.steps)
            .with_seed(self.seed, self.randomize_seed)
    }

    /// Idle → Generating. A blank prompt is rejected here and never reaches
    /// the network.
    pub fn submit(&mut self) -> Result<PendingGeneration> {
        if let PanelState::Generating { .. } = self.state {
            return Err(GalleryError::validation("A generation is already in progress"));
        }
        if self.prompt.trim().is_empty() {
            self.error = Some(BLANK_PROMPT_MESSAGE.to_string());
            return Err(GalleryError::validation(BLANK_PROMPT_MESSAGE));
        }

        let ticket = self.tickets.issue();
        self.state = PanelState::Generating { ticket };
        self.error = None;

        log::debug!("Generator submitted (seq {})", ticket.seq());

        Ok(PendingGeneration {
            ticket,
            request: self.request(),
        })
    }

    /// Generating → Idle, whatever the result.
    pub fn complete(&mut self, ticket: Ticket, result: Result<ImageSummary>) -> GenerationOutcome {
        if !self.tickets.is_current(&ticket) || self.state != (PanelState::Generating { ticket }) {
            log::debug!("Discarding stale generation result (seq {})", ticket.seq());
            return GenerationOutcome::Discarded;
        }

        self.state = PanelState::Idle;
        match result {
            Ok(image) => {
                self.prompt.clear();
                GenerationOutcome::Generated(image)
            }
            Err(err) => {
                let message = err.user_message();
                log::warn!("Generation failed: {}", message);
                self.error = Some(message.clone());
                GenerationOutcome::Failed(message)
            }
        }
    }

    /// The panel went away; any outstanding result will be discarded.
    pub fn unmount(&mut self) {
        self.tickets.advance_epoch();
        self.state = PanelState::Idle;
    }
}
