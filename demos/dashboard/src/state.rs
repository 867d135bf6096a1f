//! Dashboard state: a fixed window of Sith rows plus Obi-Wan's whereabouts.
//!
//! Every method returns a new state, so they can be used directly as
//! transformations.

use crate::protocol::{PlanetInfo, SithStatus};
use crate::server::RequestHandle;

pub const VIEWPORT_SIZE: usize = 5;
pub const SCROLL_ROWS: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SithInfo {
    pub id: u32,
    pub name: String,
    pub homeworld: PlanetInfo,
    pub master_id: Option<u32>,
    pub apprentice_id: Option<u32>,
}

impl From<SithStatus> for SithInfo {
    fn from(status: SithStatus) -> Self {
        Self {
            master_id: status.master_id(),
            apprentice_id: status.apprentice_id(),
            id: status.id,
            name: status.name,
            homeworld: status.homeworld,
        }
    }
}

/// A row is either loaded (`info` set) or waiting on `request`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SithRow {
    pub id: u32,
    pub info: Option<SithInfo>,
    pub request: Option<RequestHandle>,
}

/// A loaded row together with its position in the window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowInfo {
    pub index: usize,
    pub info: SithInfo,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardAppState {
    pub obi_wan_location: Option<PlanetInfo>,
    pub sith_list: Vec<Option<SithRow>>,
    /// Requests that fell out of the window and still need aborting.
    pub old_requests: Vec<RequestHandle>,
}

impl Default for DashboardAppState {
    fn default() -> Self {
        Self {
            obi_wan_location: None,
            sith_list: vec![None; VIEWPORT_SIZE],
            old_requests: Vec::new(),
        }
    }
}

fn loaded(index: usize, row: &Option<SithRow>) -> Option<RowInfo> {
    let info = row.as_ref()?.info.clone()?;
    Some(RowInfo { index, info })
}

impl DashboardAppState {
    /// Fills the row waiting on `status.id`. Responses for rows that
    /// already scrolled away are ignored.
    pub fn update_sith_status(&self, status: SithStatus) -> Self {
        let slot = self
            .sith_list
            .iter()
            .position(|r| r.as_ref().is_some_and(|r| r.id == status.id));
        let Some(slot) = slot else {
            log::debug!("dropping status for sith {}: no longer in view", status.id);
            return self.clone();
        };
        let mut sith_list = self.sith_list.clone();
        sith_list[slot] = Some(SithRow {
            id: status.id,
            info: Some(status.into()),
            request: None,
        });
        Self {
            sith_list,
            ..self.clone()
        }
    }

    pub fn last_known_sith(&self) -> Option<RowInfo> {
        self.sith_list
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, r)| loaded(i, r))
    }

    pub fn first_known_sith(&self) -> Option<RowInfo> {
        self.sith_list
            .iter()
            .enumerate()
            .find_map(|(i, r)| loaded(i, r))
    }

    pub fn empty_row(&self, index: usize) -> bool {
        matches!(self.sith_list.get(index), Some(None))
    }

    pub fn needs_apprentice(&self, row: Option<&RowInfo>) -> bool {
        row.is_some_and(|r| {
            r.info.apprentice_id.is_some() && r.index + 1 < VIEWPORT_SIZE && self.empty_row(r.index + 1)
        })
    }

    pub fn needs_master(&self, row: Option<&RowInfo>) -> bool {
        row.is_some_and(|r| r.info.master_id.is_some() && r.index > 0 && self.empty_row(r.index - 1))
    }

    pub fn top_empty_count(&self) -> usize {
        self.sith_list.iter().take_while(|r| r.is_none()).count()
    }

    pub fn bottom_empty_count(&self) -> usize {
        self.sith_list.iter().rev().take_while(|r| r.is_none()).count()
    }

    pub fn is_match(&self, row: &SithRow) -> bool {
        match (&self.obi_wan_location, &row.info) {
            (Some(loc), Some(info)) => info.homeworld.id == loc.id,
            _ => false,
        }
    }

    /// True when a visible Sith shares Obi-Wan's planet.
    pub fn matching_sith(&self) -> bool {
        self.sith_list.iter().flatten().any(|r| self.is_match(r))
    }

    pub fn can_scroll_up(&self) -> bool {
        !self.matching_sith()
            && self.top_empty_count() < VIEWPORT_SIZE - SCROLL_ROWS
            && self.first_known_sith().is_some_and(|r| r.info.master_id.is_some())
    }

    pub fn can_scroll_down(&self) -> bool {
        !self.matching_sith()
            && self.bottom_empty_count() < VIEWPORT_SIZE - SCROLL_ROWS
            && self.last_known_sith().is_some_and(|r| r.info.apprentice_id.is_some())
    }

    pub fn pending_rows(&self) -> usize {
        self.sith_list
            .iter()
            .flatten()
            .filter(|r| r.request.is_some())
            .count()
    }

    /// Places a pending row after the last loaded row (`append`) or before
    /// the first one. With nothing loaded, appending targets the top row.
    pub fn add_pending_request(&self, append: bool, sith_id: u32, request: RequestHandle) -> Self {
        let slot = if append {
            self.last_known_sith().map_or(0, |r| r.index + 1)
        } else {
            match self.first_known_sith() {
                Some(r) if r.index > 0 => r.index - 1,
                _ => VIEWPORT_SIZE,
            }
        };
        let mut next = self.clone();
        if slot >= VIEWPORT_SIZE {
            log::error!("no free row for sith {sith_id} (append: {append}), abandoning request");
            next.old_requests.push(request);
            return next;
        }
        if let Some(prev) = next.sith_list[slot].take().and_then(|r| r.request) {
            next.old_requests.push(prev);
        }
        next.sith_list[slot] = Some(SithRow {
            id: sith_id,
            info: None,
            request: Some(request),
        });
        next
    }

    /// Drops every pending row, handing its request over for aborting.
    pub fn clear_pending_requests(&self) -> Self {
        let mut next = self.clone();
        for slot in next.sith_list.iter_mut() {
            if slot.as_ref().is_some_and(|r| r.request.is_some()) {
                next.old_requests.extend(slot.take().and_then(|r| r.request));
            }
        }
        next
    }

    /// Shifts the window by `delta` rows. Negative values reveal masters at
    /// the top, positive values reveal apprentices at the bottom.
    pub fn scroll_adjust(&self, delta: i32) -> Self {
        let n = (delta.unsigned_abs() as usize).min(VIEWPORT_SIZE);
        let mut next = self.clone();
        let dropped: Vec<Option<SithRow>> = if delta < 0 {
            let tail = next.sith_list.split_off(VIEWPORT_SIZE - n);
            let mut rows = vec![None; n];
            rows.append(&mut next.sith_list);
            next.sith_list = rows;
            tail
        } else {
            let head = next.sith_list.drain(..n).collect();
            next.sith_list.resize(VIEWPORT_SIZE, None);
            head
        };
        next.old_requests
            .extend(dropped.into_iter().flatten().filter_map(|r| r.request));
        next
    }

    /// Records a new location; a match freezes the list by clearing
    /// everything still loading.
    pub fn update_obi_wan(&self, location: PlanetInfo) -> Self {
        let next = Self {
            obi_wan_location: Some(location),
            ..self.clone()
        };
        if next.matching_sith() {
            log::info!("obi-wan is with a sith lord, freezing the list");
            next.clear_pending_requests()
        } else {
            next
        }
    }

    /// Removes the given handles from `old_requests`, keeping any added since.
    pub fn forget_requests(&self, aborted: &[RequestHandle]) -> Self {
        let old_requests = self
            .old_requests
            .iter()
            .filter(|r| !aborted.contains(r))
            .cloned()
            .collect();
        Self {
            old_requests,
            ..self.clone()
        }
    }
}
