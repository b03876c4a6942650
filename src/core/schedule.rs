use crate::core::conflict::ConflictDetector;
use crate::core::grid::{CellContent, GridLayout, ScheduleGrid};
use crate::core::time_parser;
use crate::domain::model::{PlacedClass, ScheduleChange, SectionRecord, TimeInterval};
use crate::domain::ports::ScheduleObserver;
use crate::utils::error::{Result, SchedError};

/// In-memory set of placed sections and the grid derived from them.
///
/// All mutation goes through [`Schedule::add`], [`Schedule::remove`] and
/// [`Schedule::clear`]; ids stay unique.
pub struct Schedule {
    grid: ScheduleGrid,
    classes: Vec<PlacedClass>,
    observers: Vec<Box<dyn ScheduleObserver>>,
}

impl Schedule {
    pub fn new(layout: GridLayout) -> Self {
        Self {
            grid: ScheduleGrid::new(layout),
            classes: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: impl ScheduleObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn layout(&self) -> &GridLayout {
        self.grid.layout()
    }

    pub fn grid(&self) -> &ScheduleGrid {
        &self.grid
    }

    pub fn list(&self) -> &[PlacedClass] {
        &self.classes
    }

    pub fn get(&self, id: &str) -> Option<&PlacedClass> {
        self.classes.iter().find(|class| class.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// 只檢查不寫入：解析時間並偵測衝突
    pub fn check(&self, record: &SectionRecord) -> Result<TimeInterval> {
        let interval = time_parser::parse_placeable(&record.time)?;

        let id = record.id();
        if self.contains(&id) {
            return Err(SchedError::DuplicateSection { id });
        }

        match ConflictDetector::new(self.layout()).detect(&interval, &self.classes) {
            Some(conflict) => Err(SchedError::Conflict(conflict)),
            None => Ok(interval),
        }
    }

    /// Places a section; state is untouched when it fails.
    pub fn add(&mut self, record: SectionRecord) -> Result<PlacedClass> {
        let interval = self.check(&record)?;
        let placed = PlacedClass::new(record, interval);

        self.classes.push(placed.clone());

        let content = CellContent {
            subject_code: placed.record.subject_code.clone(),
            section: placed.record.section.clone(),
            time_label: placed.interval.time_label(),
            room: placed.record.room.clone(),
        };
        let cells = self.grid.place(&placed.interval, &placed.id, &content);
        tracing::debug!("Added {} ({} cells)", placed.id, cells.len());

        self.notify(&ScheduleChange::Added {
            id: placed.id.clone(),
        });
        Ok(placed)
    }

    /// Removes a section by id; `false` when it is not on the schedule.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(position) = self.classes.iter().position(|class| class.id == id) else {
            tracing::debug!("Remove ignored, {} is not placed", id);
            return false;
        };

        let cells = self.grid.unplace(id);
        self.classes.remove(position);
        tracing::debug!("Removed {} ({} cells restored)", id, cells.len());

        self.notify(&ScheduleChange::Removed { id: id.to_string() });
        true
    }

    /// 逐一移除，與單筆移除有相同的副作用
    pub fn clear(&mut self) -> usize {
        let ids: Vec<String> = self.classes.iter().map(|class| class.id.clone()).collect();
        ids.iter().filter(|id| self.remove(id)).count()
    }

    fn notify(&self, change: &ScheduleChange) {
        for observer in &self.observers {
            observer.on_change(change, &self.classes);
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new(GridLayout::default())
    }
}

impl std::fmt::Debug for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schedule")
            .field("classes", &self.classes)
            .field("observers", &self.observers.len())
            .finish()
    }
}
