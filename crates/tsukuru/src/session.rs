//! Loading a project into an immutable, shareable view.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tsukuru_catalog::{
    Catalog, CatalogEntry, EncounterDetail, Passability, ResolvedReference, Resolver, SpecialEncounter, SpecialTroop,
    TroopDetail,
};
use tsukuru_common::Warnings;
use tsukuru_crypt::{prepare_resources, PrepareReport, ResourceCache};
use tsukuru_data::model::MapRecord;
use tsukuru_data::{load_project, Database, Engine, MapTree, Project, ProjectHandle, RefKind, Reference};
use tsukuru_event::{EventAnalysis, Instruction, Interpreter, PageAnalysis};

use crate::{LoadOptions, Result};

/// A fully loaded project: data, map tree, catalog and every warning
/// raised on the way. Never modified after [`Session::load`] returns.
#[derive(Debug)]
pub struct ProjectView {
    root: PathBuf,
    project: Project,
    tree: MapTree,
    catalog: Catalog,
    resources: Option<PrepareReport>,
    warnings: Warnings,
}

impl ProjectView {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn engine(&self) -> Engine {
        self.project.engine
    }

    pub fn title(&self) -> &str {
        &self.project.database.system.game_title
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn database(&self) -> &Database {
        &self.project.database
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Outcome of resource preparation, when it was requested.
    pub fn resources(&self) -> Option<&PrepareReport> {
        self.resources.as_ref()
    }

    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    /// Decoded maps in id order.
    pub fn maps(&self) -> impl Iterator<Item = &MapRecord> {
        self.project.maps.values()
    }

    pub fn map_tree(&self) -> &MapTree {
        &self.tree
    }

    pub fn map(&self, id: i32) -> Option<&MapRecord> {
        self.project.map(id)
    }

    fn interpreter(&self) -> Interpreter<'_> {
        Interpreter::new(&self.project.database)
    }

    /// Every page of one map event, interpreted.
    pub fn event(&self, map_id: i32, event_id: i32) -> Option<EventAnalysis> {
        let event = self.map(map_id)?.event(event_id)?;
        let analysis = self
            .interpreter()
            .for_map(map_id)
            .interpret_event(event, &format!("Map{map_id:03}"));
        Some(analysis.value)
    }

    /// One interpreted page. `page` is 1-based, as in the editor.
    pub fn page_instructions(&self, map_id: i32, event_id: i32, page: usize) -> Option<PageAnalysis> {
        let event = self.map(map_id)?.event(event_id)?;
        let index = page.checked_sub(1)?;
        let context = format!("Map{map_id:03}/EV{event_id:03}/{page}");
        let analysis = self
            .interpreter()
            .for_map(map_id)
            .interpret_page(event.pages.get(index)?, index, &context);
        Some(analysis.value)
    }

    pub fn common_event_instructions(&self, id: i32) -> Option<Vec<Instruction>> {
        let common = self.project.database.common_events.get(id)?;
        Some(self.interpreter().interpret_common_event(common).value)
    }

    pub fn resolve(&self, reference: Reference) -> ResolvedReference {
        Resolver::new(&self.project).resolve(&reference)
    }

    pub fn category(&self, kind: RefKind, filter: &str) -> Vec<&CatalogEntry> {
        self.catalog.category(kind, filter)
    }

    pub fn entry(&self, kind: RefKind, id: i32) -> Option<&CatalogEntry> {
        self.catalog.entry(kind, id)
    }

    pub fn troop_detail(&self, id: i32) -> Option<&TroopDetail> {
        self.catalog.troop_detail(id)
    }

    pub fn encounter_detail(&self, map_id: i32) -> Option<&EncounterDetail> {
        self.catalog.encounter_detail(map_id)
    }

    pub fn special_troops(&self) -> &[SpecialTroop] {
        self.catalog.special_troops()
    }

    pub fn special_encounters(&self) -> &[SpecialEncounter] {
        self.catalog.special_encounters()
    }

    /// Passability grid of a decoded map, using its tileset's flags.
    pub fn passability(&self, map_id: i32) -> Option<Passability> {
        let map = self.map(map_id)?;
        let tileset = self.project.database.tilesets.get(map.tileset_id);
        Some(Passability::compute(map, tileset))
    }
}

/// A successful load.
#[derive(Debug, Clone)]
pub struct Session {
    view: Arc<ProjectView>,
}

impl Session {
    /// Discover, decode, interpret and catalog the project at `path`.
    ///
    /// Nothing is produced unless every stage succeeds; recoverable problems
    /// end up in [`ProjectView::warnings`].
    pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self> {
        let path = path.as_ref();

        #[cfg(feature = "parallel")]
        if !options.is_parallel() {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(1)
                .build()
                .map_err(|e| crate::Error::ThreadPool(e.to_string()))?;
            return pool.install(|| Self::load_with(path, options));
        }

        Self::load_with(path, options)
    }

    fn load_with(path: &Path, options: &LoadOptions) -> Result<Self> {
        let started = Instant::now();
        let handle = match options.engine_override() {
            Some(engine) => ProjectHandle::open_as(path, engine)?,
            None => ProjectHandle::open(path)?,
        };

        let mut warnings = Warnings::new();
        let resources = if options.prepares_resources() {
            let cache = ResourceCache::new(options.resolved_cache_dir(handle.root()));
            let report = prepare_resources(handle.root(), handle.key(), &cache);
            warnings.extend(report.warnings.clone());
            Some(report)
        } else {
            None
        };

        let project = load_project(&handle)?.drain_into(&mut warnings);
        let tree = project.database.map_tree().drain_into(&mut warnings);
        let catalog = Catalog::build(&project).drain_into(&mut warnings);

        tracing::debug!(
            root = %handle.root().display(),
            engine = %project.engine,
            maps = project.maps.len(),
            entries = catalog.len(),
            warnings = warnings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "session_loaded"
        );

        Ok(Self {
            view: Arc::new(ProjectView {
                root: handle.root().to_path_buf(),
                project,
                tree,
                catalog,
                resources,
                warnings,
            }),
        })
    }

    pub fn view(&self) -> &Arc<ProjectView> {
        &self.view
    }

    pub fn into_view(self) -> Arc<ProjectView> {
        self.view
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;
    use std::fs;
    use tsukuru_catalog::{Resolution, SpecialReason, DOWN, UP};
    use tsukuru_crypt::PrepareStatus;
    use tsukuru_event::{EventKind, Style};

    fn write(dir: &Path, name: &str, value: serde_json::Value) {
        fs::write(dir.join(name), serde_json::to_vec(&value).unwrap()).unwrap();
    }

    fn cmd(code: i32, parameters: serde_json::Value) -> serde_json::Value {
        json!({"code": code, "indent": 0, "parameters": parameters})
    }

    /// A small MZ project: one field map with an encounter table and a boss event.
    pub(crate) fn game() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();

        write(
            &data,
            "System.json",
            json!({"gameTitle": "Quest", "switches": ["", "Boss beaten"], "elements": ["", "Physical"]}),
        );
        write(
            &data,
            "MapInfos.json",
            json!([null, {"id": 1, "name": "Field", "parentId": 0, "order": 1}, {"id": 2, "name": "Cave", "parentId": 1, "order": 2}]),
        );
        write(
            &data,
            "Items.json",
            json!([null, {"id": 1, "name": "Potion", "price": 50, "effects": [{"code": 11, "dataId": 0, "value1": 0, "value2": 500}]}]),
        );
        write(
            &data,
            "Enemies.json",
            json!([null, {"id": 1, "name": "Slime", "actions": [{"skillId": 7, "rating": 5}]}, {"id": 2, "name": "Dragon"}]),
        );
        write(
            &data,
            "Troops.json",
            json!([null,
                {"id": 1, "name": "Slime*2", "members": [{"enemyId": 1}, {"enemyId": 1}], "pages": []},
                {"id": 2, "name": "Dragon", "members": [{"enemyId": 2}], "pages": []}]),
        );
        write(
            &data,
            "Tilesets.json",
            json!([null, {"id": 1, "name": "Field", "mode": 0, "tilesetNames": [], "flags": [16, 0, 15]}]),
        );
        write(
            &data,
            "CommonEvents.json",
            json!([null, {"id": 1, "name": "Heal", "trigger": 0, "switchId": 1,
                "list": [cmd(313, json!([0, 0, 1, 1])), cmd(0, json!([]))]}]),
        );
        write(
            &data,
            "Map001.json",
            json!({
                "tilesetId": 1, "width": 2, "height": 1,
                "data": [1, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                "encounterStep": 30,
                "encounterList": [{"troopId": 1, "weight": 10, "regionSet": []}],
                "events": [null, {
                    "id": 1, "name": "Boss", "x": 1, "y": 0,
                    "pages": [{
                        "trigger": 0,
                        "list": [
                            cmd(101, json!(["", 0, 0, 2])),
                            cmd(401, json!(["Bring me a Potion, or fight!"])),
                            cmd(301, json!([0, 2, false, false])),
                            cmd(0, json!([]))
                        ]
                    }]
                }]
            }),
        );
        dir
    }

    #[test]
    fn test_load_and_query() {
        let dir = game();
        let session = Session::load(dir.path(), &LoadOptions::new()).unwrap();
        let view = session.view();

        assert_eq!(view.engine(), Engine::Mz);
        assert_eq!(view.title(), "Quest");
        assert_eq!(view.maps().count(), 1);
        let walk: Vec<i32> = view.map_tree().walk().iter().map(|row| row.id).collect();
        assert_eq!(walk, vec![1, 2]);
        // Map002 is indexed but has no file.
        assert!(view.warnings().iter().any(|w| w.context == "Map002"));
        assert!(view.resources().is_none());

        let page = view.page_instructions(1, 1, 1).unwrap();
        assert!(page.story);
        assert_eq!(page.instructions[0].style, Style::Dialogue);
        assert!(page.instructions[0].mentions.iter().any(|m| m.name.as_deref() == Some("Potion")));
        assert!(view.page_instructions(1, 1, 0).is_none());
        assert!(view.page_instructions(1, 1, 2).is_none());
        assert_eq!(view.event(1, 1).unwrap().kind, EventKind::Battle);

        let heal = view.common_event_instructions(1).unwrap();
        assert_eq!(heal.len(), 1);
        assert!(view.common_event_instructions(9).is_none());
    }

    #[test]
    fn test_catalog_queries() {
        let dir = game();
        let view = Session::load(dir.path(), &LoadOptions::new()).unwrap().into_view();

        assert_eq!(view.category(RefKind::Enemy, "sli").len(), 1);
        let slime = view.entry(RefKind::Enemy, 1).unwrap();
        assert!(slime
            .references
            .iter()
            .any(|r| r.reference == Reference::new(RefKind::Skill, 7) && r.resolution == Resolution::Unresolved));

        assert_eq!(view.troop_detail(1).unwrap().members[0].count, 2);
        assert_eq!(view.encounter_detail(1).unwrap().rows[0].weight, 10);

        let special = view.special_troops();
        assert_eq!(special.len(), 1);
        assert_eq!(special[0].troop_id, 2);
        assert_eq!(special[0].reason, SpecialReason::Story);
        assert_eq!(special[0].sites, vec!["Map001/EV001/1"]);

        let troop = view.resolve(Reference::new(RefKind::Troop, 2));
        assert_eq!(troop.label(), "Dragon");
    }

    #[test]
    fn test_passability() {
        let dir = game();
        let view = Session::load(dir.path(), &LoadOptions::new()).unwrap().into_view();
        let grid = view.passability(1).unwrap();
        assert!(grid.is_passable(0, 0, UP));
        assert!(!grid.is_passable(1, 0, DOWN));
        assert!(view.passability(2).is_none());
    }

    #[test]
    fn test_sequential_load_matches() {
        let dir = game();
        let parallel = Session::load(dir.path(), &LoadOptions::new()).unwrap();
        let sequential = Session::load(dir.path(), &LoadOptions::new().parallel(false)).unwrap();
        assert_eq!(parallel.view().project(), sequential.view().project());
        assert_eq!(parallel.view().warnings(), sequential.view().warnings());
    }

    #[test]
    fn test_prepare_without_encrypted_files() {
        let dir = game();
        let options = LoadOptions::new().prepare_resources(true);
        let view = Session::load(dir.path(), &options).unwrap().into_view();
        assert_eq!(view.resources().map(|r| &r.status), Some(&PrepareStatus::NotNeeded));
    }

    #[test]
    fn test_missing_project_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Session::load(dir.path(), &LoadOptions::new());
        assert!(matches!(result, Err(Error::Data(tsukuru_data::Error::NotAProject(_)))));
    }
}
