use crate::{
    AggregateStatus, Effect, ElementId, GetPostStatusArgs, Msg, PostHost, ResolvedLink, SourceId,
    StatusMap, TrackerState,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: TrackerState, msg: Msg) -> (TrackerState, Vec<Effect>) {
    let effects = match msg {
        Msg::Manage { containers } => {
            state.registry.clear();
            state.containers.clear();
            let mut effects = Vec::with_capacity(containers.len() + 1);
            effects.push(Effect::DisconnectContainers);
            for container in containers {
                if state.containers.insert(container) {
                    effects.push(Effect::ObserveContainer { container });
                }
            }
            effects
        }
        Msg::LinksAdded { links } => add_links(&mut state, links),
        Msg::LinksRemoved { elements } => {
            for element in elements {
                state.registry.unregister(element);
            }
            Vec::new()
        }
        Msg::LinkClassReset { element } => match state.registry.source_id_of(element) {
            Some(source_id) => {
                let source_id = source_id.to_string();
                redraw(&state, &source_id)
            }
            None => Vec::new(),
        },
        Msg::ContainerDetached { container } => {
            if state.containers.remove(&container) {
                vec![Effect::UnobserveContainer { container }]
            } else {
                Vec::new()
            }
        }
        Msg::StatusReceived(status_map) => apply_status(&mut state, &status_map),
        Msg::SetHosts(hosts) => {
            state.hosts = dedup_hosts(hosts);
            if !state.show_markers {
                return (state, Vec::new());
            }
            let source_ids = state.registry.source_ids();
            let mut effects: Vec<Effect> = source_ids
                .iter()
                .flat_map(|source_id| redraw(&state, source_id))
                .collect();
            if let Some(request) = status_request(&state, source_ids) {
                effects.push(request);
            }
            effects
        }
        Msg::ToggleMarkers(enabled) => {
            state.show_markers = enabled;
            let source_ids = state.registry.source_ids();
            if enabled {
                let mut effects: Vec<Effect> = source_ids
                    .iter()
                    .flat_map(|source_id| redraw(&state, source_id))
                    .collect();
                // Hosts enabled while the markers were off have no data yet.
                let missing = source_ids
                    .into_iter()
                    .filter(|source_id| !state.host_maps.is_complete(source_id, &state.hosts))
                    .collect();
                if let Some(request) = status_request(&state, missing) {
                    effects.push(request);
                }
                effects
            } else {
                source_ids
                    .iter()
                    .flat_map(|source_id| state.registry.elements(source_id).to_vec())
                    .map(|element| Effect::ClearMarkers { element })
                    .collect()
            }
        }
        Msg::Clear => {
            state.host_maps.clear();
            state.registry.clear();
            state.containers.clear();
            vec![Effect::DisconnectContainers]
        }
    };

    (state, effects)
}

/// Register a batch of links. Ids lacking data for some active host are
/// collected into a single status request for the whole batch.
fn add_links(state: &mut TrackerState, links: Vec<ResolvedLink>) -> Vec<Effect> {
    let mut effects = Vec::new();
    let mut missing: Vec<SourceId> = Vec::new();

    for link in links {
        if state
            .registry
            .register(link.element, &link.source_id, link.large)
        {
            effects.push(Effect::WatchLink {
                element: link.element,
            });
        }
        // Status may already be known, e.g. it arrived for another element
        // with the same id while this one was still resolving.
        effects.extend(redraw_elements(state, &link.source_id, &[link.element]));
        if !state.host_maps.is_complete(&link.source_id, &state.hosts)
            && !missing.contains(&link.source_id)
        {
            missing.push(link.source_id);
        }
    }

    if let Some(request) = status_request(state, missing) {
        effects.push(request);
    }
    effects
}

/// Merge status for tracked ids; untracked ids are ignored.
fn apply_status(state: &mut TrackerState, status_map: &StatusMap) -> Vec<Effect> {
    let mut effects = Vec::new();
    for (source_id, status) in status_map {
        if !state.registry.contains(source_id) {
            continue;
        }
        state.host_maps.merge(source_id, status);
        effects.extend(redraw(state, source_id));
    }
    effects
}

fn status_request(state: &TrackerState, source_ids: Vec<SourceId>) -> Option<Effect> {
    if source_ids.is_empty() || state.hosts.is_empty() {
        return None;
    }
    Some(Effect::RequestStatus(GetPostStatusArgs {
        source_host: state.source_host(),
        source_ids,
        post_hosts: state.hosts.clone(),
    }))
}

fn redraw(state: &TrackerState, source_id: &str) -> Vec<Effect> {
    redraw_elements(state, source_id, state.registry.elements(source_id))
}

fn redraw_elements(state: &TrackerState, source_id: &str, elements: &[ElementId]) -> Vec<Effect> {
    if !state.show_markers {
        return Vec::new();
    }
    let aggregate = AggregateStatus::compute(&state.host_maps, source_id, &state.hosts);
    elements
        .iter()
        .filter_map(|element| {
            aggregate
                .markers(state.registry.is_large(*element))
                .map(|markers| Effect::ApplyMarkers {
                    element: *element,
                    markers,
                })
        })
        .collect()
}

fn dedup_hosts(hosts: Vec<PostHost>) -> Vec<PostHost> {
    let mut unique = Vec::with_capacity(hosts.len());
    for host in hosts {
        if !unique.contains(&host) {
            unique.push(host);
        }
    }
    unique
}
