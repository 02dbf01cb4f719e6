// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod analysis;
pub mod backend;
pub mod controller;
pub mod forms;
pub mod ids;
pub mod model;
pub mod pagination;
pub mod state;

pub use analysis::*;
pub use backend::*;
pub use controller::{Action, follow_up, perform};
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use pagination::*;
pub use state::*;
