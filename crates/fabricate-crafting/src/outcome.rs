//! Craft outcomes and the inventory actions they carry.

use serde::Serialize;

use crate::alchemy::{ItemPayload, LimitExceeded};
use crate::combination::Combination;
use crate::component::CraftingComponent;
use crate::essence::EssenceDefinition;
use crate::inventory::InventoryDelta;
use crate::selection::Insufficiency;

/// Direction of an inventory change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// Component is added
    Add,
    /// Component is removed
    Remove,
}

/// One inventory change produced by a craft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FabricationAction {
    /// Component affected
    pub component: CraftingComponent,
    /// Units added or removed
    pub quantity: u32,
    /// Add or remove
    pub kind: ActionKind,
    /// Synthesized item data for dynamically created items
    pub payload: Option<ItemPayload>,
}

impl FabricationAction {
    /// Adds `quantity` of `component`.
    #[must_use]
    pub const fn add(component: CraftingComponent, quantity: u32) -> Self {
        Self {
            component,
            quantity,
            kind: ActionKind::Add,
            payload: None,
        }
    }

    /// Removes `quantity` of `component`.
    #[must_use]
    pub const fn remove(component: CraftingComponent, quantity: u32) -> Self {
        Self {
            component,
            quantity,
            kind: ActionKind::Remove,
            payload: None,
        }
    }

    /// Attaches synthesized item data.
    #[must_use]
    pub fn with_payload(mut self, payload: Option<ItemPayload>) -> Self {
        self.payload = payload;
        self
    }

    /// Signed quantity change.
    #[must_use]
    pub fn delta(&self) -> i64 {
        match self.kind {
            ActionKind::Add => i64::from(self.quantity),
            ActionKind::Remove => -i64::from(self.quantity),
        }
    }

    /// Converts to the adapter's delta form.
    #[must_use]
    pub fn to_delta(&self) -> InventoryDelta {
        InventoryDelta {
            component: self.component.id.clone(),
            change: self.delta(),
            payload: self.payload.clone(),
        }
    }

    /// Remove actions for every unit of a combination.
    pub fn removals(components: &Combination<CraftingComponent>) -> impl Iterator<Item = Self> + '_ {
        components
            .units()
            .map(|unit| Self::remove(unit.element().clone(), unit.quantity()))
    }

    /// Add actions for every unit of a combination.
    pub fn additions(components: &Combination<CraftingComponent>) -> impl Iterator<Item = Self> + '_ {
        components
            .units()
            .map(|unit| Self::add(unit.element().clone(), unit.quantity()))
    }
}

/// Terminal state of a craft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "details", rename_all = "snake_case")]
pub enum CraftStatus {
    /// Actions were applied
    Success,
    /// Requirements were not met; nothing was applied
    InsufficientResources(Insufficiency),
    /// Alchemy limits were broken; nothing was applied
    LimitExceeded(LimitExceeded),
    /// The attempt was not made
    Abandoned,
    /// The inventory rejected the changes
    Failure,
}

/// Result of a craft, alchemy or salvage request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FabricationOutcome {
    /// Terminal state
    pub status: CraftStatus,
    /// Human-readable summary
    pub message: String,
    /// Inventory changes, applied only on success
    pub actions: Vec<FabricationAction>,
}

impl FabricationOutcome {
    /// A successful craft.
    #[must_use]
    pub fn success(message: impl Into<String>, actions: Vec<FabricationAction>) -> Self {
        Self {
            status: CraftStatus::Success,
            message: message.into(),
            actions,
        }
    }

    /// Requirements were not met.
    #[must_use]
    pub fn insufficient(subject: &str, missing: Insufficiency) -> Self {
        Self {
            message: describe_insufficiency(subject, &missing),
            status: CraftStatus::InsufficientResources(missing),
            actions: Vec::new(),
        }
    }

    /// Alchemy limits were broken.
    #[must_use]
    pub fn limit_exceeded(limit: LimitExceeded) -> Self {
        Self {
            message: limit.to_string(),
            status: CraftStatus::LimitExceeded(limit),
            actions: Vec::new(),
        }
    }

    /// The attempt was abandoned before anything was evaluated.
    #[must_use]
    pub fn abandoned(message: impl Into<String>) -> Self {
        Self {
            status: CraftStatus::Abandoned,
            message: message.into(),
            actions: Vec::new(),
        }
    }

    /// Applying the planned actions failed. The actions are kept so the
    /// caller can see what was attempted.
    #[must_use]
    pub fn failure(message: impl Into<String>, actions: Vec<FabricationAction>) -> Self {
        Self {
            status: CraftStatus::Failure,
            message: message.into(),
            actions,
        }
    }

    /// Whether the craft succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, CraftStatus::Success)
    }

    /// Actions of one kind.
    pub fn actions_of(&self, kind: ActionKind) -> impl Iterator<Item = &FabricationAction> + '_ {
        self.actions.iter().filter(move |action| action.kind == kind)
    }
}

/// Outcome of an alchemy attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlchemicalCraftOutcome {
    /// Status, message and actions
    pub outcome: FabricationOutcome,
    /// Names of the matched effects
    pub effects: Vec<String>,
    /// Essence units no effect used
    pub leftover_essences: Combination<EssenceDefinition>,
    /// The greedy match would have differed
    pub diverges_from_greedy: bool,
}

impl AlchemicalCraftOutcome {
    /// An outcome without any matching.
    #[must_use]
    pub fn unmatched(outcome: FabricationOutcome) -> Self {
        Self {
            outcome,
            effects: Vec::new(),
            leftover_essences: Combination::new(),
            diverges_from_greedy: false,
        }
    }

    /// Synthesized item data, when the craft succeeded with matched effects.
    #[must_use]
    pub fn payload(&self) -> Option<&ItemPayload> {
        self.outcome
            .actions_of(ActionKind::Add)
            .find_map(|action| action.payload.as_ref())
    }
}

fn describe_insufficiency(subject: &str, missing: &Insufficiency) -> String {
    let list = |components: &Combination<CraftingComponent>| {
        components
            .units()
            .map(|unit| format!("{} x {}", unit.quantity(), unit.element().name))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut parts = Vec::new();
    if !missing.missing_catalysts.is_empty() {
        parts.push(format!("catalysts {}", list(&missing.missing_catalysts)));
    }
    if !missing.missing_ingredients.is_empty() {
        parts.push(format!("ingredients {}", list(&missing.missing_ingredients)));
    }
    if !missing.missing_essences.is_empty() {
        let essences = missing
            .missing_essences
            .units()
            .map(|unit| format!("{} x {}", unit.quantity(), unit.element().name))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("essences {essences}"));
    }
    format!("Insufficient resources to craft {subject}. Missing {}.", parts.join("; "))
}
