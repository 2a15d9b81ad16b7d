use crate::{Effect, LoopKind, Msg, OrchestratorState, TargetInfo, ToggleName};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: OrchestratorState, msg: Msg) -> (OrchestratorState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started { toggles } => {
            let mut effects = Vec::new();
            for toggle in toggles.enabled() {
                effects.extend(set_toggle(&mut state, toggle, true));
            }
            if state.adopted().is_none() {
                effects.push(Effect::ScanTargets);
            }
            effects
        }
        Msg::TargetsListed(targets) => {
            // A navigation may have adopted an instance while the scan was in flight.
            if state.adopted().is_some() {
                return (state, Vec::new());
            }
            let found = targets
                .into_iter()
                .find(|target| state.pattern().matches(&target.url));
            match found {
                Some(target) => adopt(&mut state, target),
                None => Vec::new(),
            }
        }
        Msg::Activated => match state.adopted() {
            Some(instance) => vec![Effect::ProbeLiveness(instance.clone())],
            None => vec![Effect::ScanTargets],
        },
        Msg::LivenessChecked { instance, alive } => {
            if alive || !state.is_adopted(&instance) {
                Vec::new()
            } else {
                release_and_rescan(&mut state)
            }
        }
        Msg::NavigationCompleted(target) => {
            if state.pattern().matches(&target.url) {
                adopt(&mut state, target)
            } else if state.is_adopted_target(&target.id) {
                release_and_rescan(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::TargetClosed(target) => {
            if state.is_adopted_target(&target) {
                release_and_rescan(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::ToggleRequested { toggle, enabled } => set_toggle(&mut state, toggle, enabled),
        Msg::Shutdown => state.release().map(Effect::Teardown).into_iter().collect(),
    };

    (state, effects)
}

fn adopt(state: &mut OrchestratorState, target: TargetInfo) -> Vec<Effect> {
    let mut effects = Vec::new();
    // Same target: keep the instance, the guards make re-installs no-ops.
    let kept = state
        .adopted()
        .filter(|current| current.target == target.id)
        .cloned();
    let instance = match kept {
        Some(instance) => instance,
        None => {
            if let Some(previous) = state.release() {
                effects.push(Effect::Teardown(previous));
            }
            let instance = state.adopt(target.id);
            effects.push(Effect::Attach(instance.clone()));
            instance
        }
    };

    effects.push(Effect::Install {
        instance: instance.clone(),
        kind: LoopKind::Monitor,
    });
    for toggle in state.toggles().enabled() {
        effects.push(Effect::Install {
            instance: instance.clone(),
            kind: toggle.loop_kind(),
        });
    }
    effects
}

fn release_and_rescan(state: &mut OrchestratorState) -> Vec<Effect> {
    let mut effects: Vec<Effect> = state.release().map(Effect::Teardown).into_iter().collect();
    effects.push(Effect::ScanTargets);
    effects
}

fn set_toggle(state: &mut OrchestratorState, toggle: ToggleName, enabled: bool) -> Vec<Effect> {
    state.toggles_mut().set(toggle, enabled);
    let mut effects = vec![Effect::PersistToggle { toggle, enabled }];
    if let Some(instance) = state.adopted() {
        let instance = instance.clone();
        let kind = toggle.loop_kind();
        effects.push(if enabled {
            Effect::Install { instance, kind }
        } else {
            Effect::Stop { instance, kind }
        });
    }
    effects
}
