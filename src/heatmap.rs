//! Per-class mastery heatmap model.
//!
//! Pure transform from the dashboard's nested topic → child → level map into
//! a render-ready grid, plus the single "currently selected cell" used for
//! the tooltip. A cell's display is a function of its mastery string alone.

use serde_json::Value;

use crate::types::Child;

/// Enumerated mastery label for one (topic, student) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasteryLevel {
    Mastered,
    Improving,
    Learning,
    /// No data, or an unrecognized level string from the server.
    Unknown,
}

impl MasteryLevel {
    /// Resolve a server level string. Unrecognized strings degrade to
    /// [`MasteryLevel::Unknown`] rather than failing the render.
    pub fn parse(raw: &str) -> MasteryLevel {
        match raw {
            "mastered" => MasteryLevel::Mastered,
            "improving" => MasteryLevel::Improving,
            "learning" => MasteryLevel::Learning,
            _ => MasteryLevel::Unknown,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            MasteryLevel::Mastered => "#16a34a",
            MasteryLevel::Improving => "#f59e0b",
            MasteryLevel::Learning => "#fb923c",
            MasteryLevel::Unknown => "#d1d5db",
        }
    }

    /// Display label from the fixed table — never the raw server string.
    pub fn label(self) -> &'static str {
        match self {
            MasteryLevel::Mastered => "Mastered",
            MasteryLevel::Improving => "Improving",
            MasteryLevel::Learning => "Learning",
            MasteryLevel::Unknown => "No data",
        }
    }
}

/// Render-ready display tuple for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapCell {
    pub level: MasteryLevel,
    pub color: &'static str,
    pub label: &'static str,
}

impl From<MasteryLevel> for HeatmapCell {
    fn from(level: MasteryLevel) -> Self {
        HeatmapCell {
            level,
            color: level.color(),
            label: level.label(),
        }
    }
}

/// Position of a cell in the grid: `row` indexes topics, `col` children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

/// Tooltip metadata for the selected cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellTooltip {
    pub topic: String,
    pub child_name: String,
    pub label: &'static str,
}

/// The mastery grid: rows are topics in the server map's key order, columns
/// are children in the given order.
#[derive(Debug, Clone)]
pub struct HeatmapGrid {
    pub topics: Vec<String>,
    pub children: Vec<Child>,
    /// `cells[row][col]`, always `topics.len() × children.len()`.
    pub cells: Vec<Vec<HeatmapCell>>,
    selected: Option<CellRef>,
}

impl HeatmapGrid {
    /// Build the grid from the dashboard payload. Renders (as an explicit
    /// empty state) even when `children` or the heatmap is empty; malformed
    /// entries degrade to "no data" cells.
    pub fn build(children: &[Child], heatmap: &serde_json::Map<String, Value>) -> HeatmapGrid {
        let mut topics = Vec::with_capacity(heatmap.len());
        let mut cells = Vec::with_capacity(heatmap.len());

        for (topic, per_child) in heatmap {
            let row: Vec<HeatmapCell> = children
                .iter()
                .map(|child| {
                    let level = per_child
                        .as_object()
                        .and_then(|m| m.get(&child.id))
                        .and_then(Value::as_str)
                        .map(MasteryLevel::parse)
                        .unwrap_or(MasteryLevel::Unknown);
                    HeatmapCell::from(level)
                })
                .collect();
            topics.push(topic.clone());
            cells.push(row);
        }

        HeatmapGrid {
            topics,
            children: children.to_vec(),
            cells,
            selected: None,
        }
    }

    /// Empty grid for the error/degraded dashboard branch.
    pub fn empty() -> HeatmapGrid {
        HeatmapGrid {
            topics: Vec::new(),
            children: Vec::new(),
            cells: Vec::new(),
            selected: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty() || self.children.is_empty()
    }

    /// Select a cell for the tooltip, replacing any prior selection.
    /// Out-of-bounds selections are ignored and report `false`.
    pub fn select(&mut self, row: usize, col: usize) -> bool {
        if row >= self.topics.len() || col >= self.children.len() {
            return false;
        }
        self.selected = Some(CellRef { row, col });
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<CellRef> {
        self.selected
    }

    /// Tooltip for the currently selected cell, if any.
    pub fn tooltip(&self) -> Option<CellTooltip> {
        let sel = self.selected?;
        let cell = self.cells.get(sel.row)?.get(sel.col)?;
        Some(CellTooltip {
            topic: self.topics.get(sel.row)?.clone(),
            child_name: self.children.get(sel.col)?.name.clone(),
            label: cell.label,
        })
    }
}
