//! Deferred mutations issued by behaviors and plugins.
//!
//! Extensions never touch the scene or viewport directly. They push commands that the graph
//! applies in issuance order through its public operations, so every observer sees them.

use std::collections::VecDeque;

use narwhal_render::Point;
use serde::Serialize;

use crate::extension::Category;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    Pan {
        dx: f64,
        dy: f64,
    },
    ZoomTo {
        scale: f64,
        anchor: Option<[f64; 2]>,
    },
    ZoomBy {
        ratio: f64,
        anchor: Option<[f64; 2]>,
    },
    RotateTo {
        radians: f64,
    },
    Resize {
        width: f64,
        height: f64,
    },
    FitView {
        padding: f64,
    },
    MoveNode {
        id: String,
        x: f64,
        y: f64,
    },
    SetState {
        id: String,
        state: String,
        enabled: bool,
    },
}

impl Command {
    pub(crate) fn anchor_point(anchor: Option<[f64; 2]>) -> Option<Point> {
        anchor.map(|[x, y]| Point::new(x, y))
    }
}

/// Extension that issued a command.
pub(crate) type Issuer = Option<(Category, String)>;

/// Commands in issuance order, each tagged with the extension that pushed it.
#[derive(Debug, Default)]
pub struct Commands {
    queue: VecDeque<(Issuer, Command)>,
    issuer: Issuer,
}

impl Commands {
    pub fn push(&mut self, command: Command) {
        self.queue.push_back((self.issuer.clone(), command));
    }

    pub(crate) fn issue_as(&mut self, category: Category, key: &str) {
        self.issuer = Some((category, key.to_string()));
    }

    pub(crate) fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn pop(&mut self) -> Option<(Issuer, Command)> {
        self.queue.pop_front()
    }
}
