//! Keeps an external interactive map in step with application state.
//!
//! The UI hands a [`MapSnapshot`] to [`MapSyncController::reconcile`] after
//! every state change. The controller compares it with what it last drew
//! and issues only the surface calls needed to close the gap.
//!
//! # Layer lifecycle
//!
//! | Layer | Created | Updated | Removed |
//! |-------|---------|---------|---------|
//! | base tiles | first reconcile | replaced when the style changes | dispose |
//! | boundary, room markers | first reconcile | never | dispose |
//! | user marker | first fix | moved in place | fix disappears, dispose |
//! | selected room, route | selection changes | never (remove + add) | selection changes, dispose |
//!
//! Handles are taken out of the [`LayerSet`] before they are removed, so a
//! handle can be removed at most once and never touched afterwards.
//!
//! # Readiness
//!
//! Until the surface reports ready, snapshots are queued (only the latest
//! is kept) and replayed on the transition to ready.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::access::CampusBoundary;
use crate::catalog::{Room, RoomCatalog, RoomId};
use crate::config::MapSettings;
use crate::error::{Error, Result};
use crate::geometry::{bounds_of, LatLon};
use crate::location::UserLocation;
use crate::readiness::{dispose_channel, poll_until, DisposeHandle, DisposeSignal};
use crate::route::RouteEstimate;
use crate::surface::{MapSurface, MarkerVisual};

/// Desired map state at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSnapshot {
    /// Tile style key; unknown keys fall back to the default style.
    pub style: String,
    pub user: Option<UserLocation>,
    pub selected_room: Option<RoomId>,
    /// Only drawn together with a selection.
    pub route: Option<RouteEstimate>,
}

impl MapSnapshot {
    pub fn new(style: &str) -> Self {
        Self {
            style: style.to_string(),
            user: None,
            selected_room: None,
            route: None,
        }
    }

    pub fn with_user(mut self, user: UserLocation) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_selection(mut self, room: RoomId, route: Option<RouteEstimate>) -> Self {
        self.selected_room = Some(room);
        self.route = route;
        self
    }
}

/// Stable identity of a layer the controller manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerKey {
    Base,
    Boundary,
    Room(RoomId),
    User,
    SelectedRoom,
    Route,
}

/// Live layer handles by key. Owned by the controller alone.
#[derive(Debug)]
pub struct LayerSet<H> {
    layers: BTreeMap<LayerKey, H>,
}

impl<H> Default for LayerSet<H> {
    fn default() -> Self {
        Self {
            layers: BTreeMap::new(),
        }
    }
}

impl<H> LayerSet<H> {
    fn insert(&mut self, key: LayerKey, handle: H) {
        let previous = self.layers.insert(key, handle);
        debug_assert!(previous.is_none(), "layer {:?} created twice", key);
    }

    fn get(&self, key: LayerKey) -> Option<&H> {
        self.layers.get(&key)
    }

    /// Remove the entry and hand back the handle. Second call returns `None`.
    fn take(&mut self, key: LayerKey) -> Option<H> {
        self.layers.remove(&key)
    }

    fn drain(&mut self) -> Vec<(LayerKey, H)> {
        std::mem::take(&mut self.layers).into_iter().collect()
    }

    pub fn contains(&self, key: LayerKey) -> bool {
        self.layers.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = LayerKey> + '_ {
        self.layers.keys().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Ready,
    Disposed,
}

/// Surface calls issued by one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerChanges {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    /// A fit or pan was issued.
    pub view_moved: bool,
}

impl LayerChanges {
    pub fn is_empty(&self) -> bool {
        *self == LayerChanges::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    Applied(LayerChanges),
    /// Surface not ready yet; the snapshot will be replayed.
    Queued,
    Disposed,
}

/// Selection as last rendered.
#[derive(Debug, Clone, Default, PartialEq)]
struct Selection {
    room: Option<RoomId>,
    route: Option<RouteEstimate>,
}

impl Selection {
    fn from_snapshot(snapshot: &MapSnapshot) -> Self {
        match snapshot.selected_room {
            Some(room) => Self {
                room: Some(room),
                route: snapshot.route.clone(),
            },
            None => Self::default(),
        }
    }
}

/// Drives a [`MapSurface`] from a stream of [`MapSnapshot`]s.
pub struct MapSyncController<S: MapSurface> {
    surface: S,
    catalog: Arc<RoomCatalog>,
    boundary: CampusBoundary,
    settings: MapSettings,
    state: ControllerState,
    layers: LayerSet<S::Handle>,
    pending: Option<MapSnapshot>,
    statics_created: bool,
    rendered_style: Option<String>,
    rendered_selection: Selection,
    rendered_user: Option<LatLon>,
    last_user: Option<UserLocation>,
    dispose_handle: DisposeHandle,
    dispose_signal: DisposeSignal,
}

impl<S: MapSurface> MapSyncController<S> {
    pub fn new(
        surface: S,
        catalog: Arc<RoomCatalog>,
        boundary: CampusBoundary,
        settings: MapSettings,
    ) -> Self {
        let (dispose_handle, dispose_signal) = dispose_channel();
        Self {
            surface,
            catalog,
            boundary,
            settings,
            state: ControllerState::Uninitialized,
            layers: LayerSet::default(),
            pending: None,
            statics_created: false,
            rendered_style: None,
            rendered_selection: Selection::default(),
            rendered_user: None,
            last_user: None,
            dispose_handle,
            dispose_signal,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn catalog(&self) -> &Arc<RoomCatalog> {
        &self.catalog
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn has_layer(&self, key: LayerKey) -> bool {
        self.layers.contains(key)
    }

    pub fn layer_keys(&self) -> Vec<LayerKey> {
        self.layers.keys().collect()
    }

    pub fn pending_snapshot(&self) -> Option<&MapSnapshot> {
        self.pending.as_ref()
    }

    /// Handle that disposes this controller from elsewhere; also cancels a
    /// pending [`wait_until_ready`](Self::wait_until_ready).
    pub fn dispose_handle(&self) -> DisposeHandle {
        self.dispose_handle.clone()
    }

    /// Bring the surface in line with `snapshot`.
    pub fn reconcile(&mut self, snapshot: MapSnapshot) -> ReconcileOutcome {
        if self.dispose_signal.is_disposed() {
            self.dispose();
        }
        match self.state {
            ControllerState::Disposed => ReconcileOutcome::Disposed,
            ControllerState::Ready => ReconcileOutcome::Applied(self.apply(&snapshot)),
            ControllerState::Uninitialized => {
                if self.pending.replace(snapshot).is_some() {
                    log::debug!("Coalesced queued map snapshot");
                }
                match self.try_become_ready() {
                    Some(changes) => ReconcileOutcome::Applied(changes),
                    None => ReconcileOutcome::Queued,
                }
            }
        }
    }

    /// Check the surface once; on success replay any queued snapshot.
    pub fn poll_ready(&mut self) -> bool {
        match self.state {
            ControllerState::Ready => true,
            ControllerState::Disposed => false,
            ControllerState::Uninitialized => self.try_become_ready().is_some(),
        }
    }

    /// Wait for the surface with the configured interval and attempt budget.
    ///
    /// On timeout the latest snapshot stays queued and the caller may try
    /// again later. Disposal (directly or through a [`DisposeHandle`]) ends
    /// the wait with [`Error::Disposed`].
    pub async fn wait_until_ready(&mut self) -> Result<()> {
        match self.state {
            ControllerState::Ready => return Ok(()),
            ControllerState::Disposed => return Err(Error::Disposed),
            ControllerState::Uninitialized => {}
        }

        let config = self.settings.readiness.clone();
        let surface = &self.surface;
        let result = poll_until(|| surface.is_ready(), &config, &mut self.dispose_signal).await;

        match result {
            Ok(checks) => {
                log::debug!("Map surface ready after {} checks", checks);
                self.enter_ready();
                Ok(())
            }
            Err(Error::Disposed) => {
                self.dispose();
                Err(Error::Disposed)
            }
            Err(e) => {
                log::warn!("{}; latest snapshot stays queued", e);
                Err(e)
            }
        }
    }

    /// Remove every layer and stop accepting snapshots. Idempotent.
    pub fn dispose(&mut self) {
        if self.state == ControllerState::Disposed {
            return;
        }
        let layers = self.layers.drain();
        let count = layers.len();
        for (_, handle) in layers {
            self.surface.remove_layer(handle);
        }
        self.pending = None;
        self.state = ControllerState::Disposed;
        self.dispose_handle.dispose();
        log::info!("Map controller disposed ({} layers removed)", count);
    }

    fn try_become_ready(&mut self) -> Option<LayerChanges> {
        if self.dispose_signal.is_disposed() {
            self.dispose();
            return None;
        }
        if !self.surface.is_ready() {
            return None;
        }
        Some(self.enter_ready())
    }

    fn enter_ready(&mut self) -> LayerChanges {
        self.state = ControllerState::Ready;
        log::info!("Map surface ready");
        match self.pending.take() {
            Some(snapshot) => self.apply(&snapshot),
            None => LayerChanges::default(),
        }
    }

    fn apply(&mut self, snapshot: &MapSnapshot) -> LayerChanges {
        let mut changes = LayerChanges::default();
        self.sync_base_layer(&snapshot.style, &mut changes);
        self.create_static_layers(&mut changes);
        self.sync_user_marker(snapshot.user.as_ref(), &mut changes);
        self.sync_selection(Selection::from_snapshot(snapshot), &mut changes);
        if !changes.is_empty() {
            log::debug!("Reconciled map: {:?}", changes);
        }
        changes
    }

    // ── Base tiles ──────────────────────────────────────────────────────

    fn sync_base_layer(&mut self, requested: &str, changes: &mut LayerChanges) {
        let Some(style) = self.settings.styles.resolve(requested).cloned() else {
            log::warn!("No tile styles configured; base layer left as is");
            return;
        };
        if self.rendered_style.as_deref() == Some(style.key.as_str()) {
            return;
        }
        if let Some(old) = self.layers.take(LayerKey::Base) {
            self.surface.remove_layer(old);
            changes.removed += 1;
        }
        let handle = self.surface.create_base_layer(&style);
        self.layers.insert(LayerKey::Base, handle);
        changes.created += 1;
        log::debug!("Base layer style {:?}", style.key);
        self.rendered_style = Some(style.key);
    }

    // ── Boundary and room markers (create once) ────────────────────────

    fn create_static_layers(&mut self, changes: &mut LayerChanges) {
        if self.statics_created {
            return;
        }
        self.statics_created = true;

        if self.boundary.is_enforceable() {
            let handle = self
                .surface
                .create_polygon_overlay(self.boundary.vertices(), &self.settings.theme.boundary);
            self.layers.insert(LayerKey::Boundary, handle);
            changes.created += 1;
        }

        let catalog = Arc::clone(&self.catalog);
        for room in catalog.all() {
            let visual = room_visual(room, &self.settings);
            let handle = self.surface.create_marker(room.position, &visual);
            self.layers.insert(LayerKey::Room(room.id), handle);
            changes.created += 1;
        }

        let campus = if self.boundary.is_enforceable() {
            self.boundary.bounds()
        } else {
            catalog.bounds()
        };
        if let Some(bounds) = campus {
            self.surface.fit_bounds(bounds, self.settings.fit_padding);
            changes.view_moved = true;
        }
    }

    // ── User marker (create once, move in place) ───────────────────────

    fn sync_user_marker(&mut self, user: Option<&UserLocation>, changes: &mut LayerChanges) {
        let Some(fix) = user else {
            if let Some(handle) = self.layers.take(LayerKey::User) {
                self.surface.remove_layer(handle);
                changes.removed += 1;
                self.rendered_user = None;
            }
            return;
        };

        if let Some(last) = &self.last_user {
            if !fix.supersedes(last) {
                log::debug!("Ignoring stale location #{} (latest #{})", fix.seq, last.seq);
                return;
            }
        }
        if !fix.position.is_finite() {
            log::warn!("Ignoring non-finite user location #{}", fix.seq);
            return;
        }
        self.last_user = Some(*fix);

        match self.layers.get(LayerKey::User) {
            Some(handle) => {
                if self.rendered_user != Some(fix.position) {
                    self.surface.update_marker_position(handle, fix.position);
                    self.rendered_user = Some(fix.position);
                    changes.updated += 1;
                }
            }
            None => {
                let visual = MarkerVisual {
                    style: self.settings.theme.user_marker.clone(),
                    tooltip: "You are here".to_string(),
                    popup: Some("Your current location".to_string()),
                };
                let handle = self.surface.create_marker(fix.position, &visual);
                self.layers.insert(LayerKey::User, handle);
                self.rendered_user = Some(fix.position);
                changes.created += 1;
            }
        }
    }

    // ── Selected room and route (remove, then add) ─────────────────────

    fn sync_selection(&mut self, desired: Selection, changes: &mut LayerChanges) {
        if desired == self.rendered_selection {
            return;
        }

        for key in [LayerKey::SelectedRoom, LayerKey::Route] {
            if let Some(handle) = self.layers.take(key) {
                self.surface.remove_layer(handle);
                changes.removed += 1;
            }
        }

        if let Some(id) = desired.room {
            let catalog = Arc::clone(&self.catalog);
            match catalog.by_id(id) {
                Some(room) => self.draw_selection(room, desired.route.as_ref(), changes),
                None => log::warn!("Selected room {} is not in the catalog", id),
            }
        }

        self.rendered_selection = desired;
    }

    fn draw_selection(&mut self, room: &Room, route: Option<&RouteEstimate>, changes: &mut LayerChanges) {
        let visual = MarkerVisual {
            style: self.settings.theme.selected_marker.clone(),
            tooltip: format!("Destination: {}", room.name),
            popup: Some(room_popup(room)),
        };
        let handle = self.surface.create_marker(room.position, &visual);
        self.layers.insert(LayerKey::SelectedRoom, handle);
        changes.created += 1;

        match route {
            Some(route) => {
                let handle = self
                    .surface
                    .create_line_overlay(route.geometry(), &self.settings.theme.route_line);
                self.layers.insert(LayerKey::Route, handle);
                changes.created += 1;
                if let Ok(bounds) = bounds_of(route.geometry()) {
                    self.surface.fit_bounds(bounds, self.settings.fit_padding);
                    changes.view_moved = true;
                }
            }
            None => {
                self.surface.pan_to(room.position);
                changes.view_moved = true;
            }
        }
    }
}

fn room_popup(room: &Room) -> String {
    let mut popup = format!("{}\nBuilding: {}\nFloor: {}", room.name, room.building, room.floor);
    if let Some(category) = &room.category {
        popup.push_str(&format!("\nCategory: {}", category));
    }
    popup
}

fn room_visual(room: &Room, settings: &MapSettings) -> MarkerVisual {
    MarkerVisual {
        style: settings.theme.room_marker.clone(),
        tooltip: room.name.clone(),
        popup: Some(room_popup(room)),
    }
}
