//! Model Builder: translates an [`InputModel`] into CP-SAT decision
//! variables and posts the hard constraints H1-H4 and the soft objective
//! O1-O2.
//!
//! The encoding technique throughout -- booleans reified against a linear
//! relation via `only_enforce_if`, weighted sums built by collecting
//! `(i64, BoolVar)` pairs into a `LinearExpr`.

use cp_sat::builder::{BoolVar, CpModelBuilder, IntVar, LinearExpr};
use log::{debug, info};

use crate::config::SchedulerConfig;
use crate::domain::{RoomType, SLOTS};
use crate::error::SchedulerError;
use crate::loader::InputModel;

#[derive(Clone)]
pub(crate) struct ModuleVars {
    pub day: IntVar,
    pub slot: IntVar,
    pub room: IntVar,
    pub proctor: IntVar,
    /// Number of rooms whose exam capacity covers this module, i.e. the
    /// width of `room`'s domain (`[0, room_capacity_count)`). Needed by the
    /// Extractor to translate `room` back to a room id, since the domain is
    /// a capacity-filtered prefix of `InputModel::rooms`, not the full list.
    pub room_capacity_count: usize,
}

/// Opaque solver-ready model: a CP-SAT builder plus one [`ModuleVars`] per
/// examinable module, in `InputModel` order.
pub struct SolverModel {
    pub(crate) model: CpModelBuilder,
    pub(crate) vars: Vec<ModuleVars>,
}

pub fn build(
    input: &InputModel,
    nb_days: i32,
    config: &SchedulerConfig,
) -> Result<SolverModel, SchedulerError> {
    let mut model = CpModelBuilder::default();
    let num_modules = input.modules.len();
    let num_proctors = input.proctors.len().max(1);

    let mut vars = Vec::with_capacity(num_modules);
    for m in 0..num_modules {
        // H1 -- capacity: rooms are ordered by exam capacity descending,
        // so the rooms with enough capacity for module m form a
        // contiguous prefix `[0, k)`. Restricting room[m]'s domain to that
        // prefix *is* the allowed-assignments table constraint of H1.
        let size = input.size_of[m];
        let k = input
            .rooms
            .iter()
            .take_while(|r| r.exam_capacity >= size)
            .count();
        if k == 0 {
            return Err(SchedulerError::CapacityInfeasible(input.module_ids[m]));
        }

        let day = model.new_int_var(vec![(0, (nb_days - 1) as i64)]);
        let slot = model.new_int_var(vec![(0, (SLOTS.len() - 1) as i64)]);
        let room = model.new_int_var(vec![(0, (k - 1) as i64)]);
        let proctor = model.new_int_var(vec![(0, (num_proctors - 1) as i64)]);

        vars.push(ModuleVars {
            day,
            slot,
            room,
            proctor,
            room_capacity_count: k,
        });
    }
    info!("model: {} module variable sets created", vars.len());

    add_student_noncollision_constraints(&mut model, input, &vars, config);
    add_room_slot_exclusivity_constraints(&mut model, &vars, config);
    if config.promote_proctor_cap {
        add_proctor_day_cap_constraints(&mut model, input, &vars, nb_days);
    }

    let objective = build_objective(&mut model, input, &vars);
    model.maximize(objective);

    Ok(SolverModel { model, vars })
}

/// H2 -- student non-collision (same day). Emits `day[m1] != day[m2]` for
/// every pair of modules shared by a student, restricted to the top-K
/// students by degree and halted at a total constraint budget.
fn add_student_noncollision_constraints(
    model: &mut CpModelBuilder,
    input: &InputModel,
    vars: &[ModuleVars],
    config: &SchedulerConfig,
) {
    let mut by_degree: Vec<(&i32, &Vec<usize>)> = input.modules_of_student.iter().collect();
    by_degree.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    by_degree.truncate(config.max_students_for_h2);

    let mut emitted = 0usize;
    'students: for (_student_id, module_idxs) in by_degree {
        if module_idxs.len() < 2 {
            continue;
        }
        for i in 0..module_idxs.len() {
            for j in (i + 1)..module_idxs.len() {
                let (mi, mj) = (module_idxs[i], module_idxs[j]);
                model.add_ne(
                    LinearExpr::from(vars[mi].day.clone()),
                    LinearExpr::from(vars[mj].day.clone()),
                );
                emitted += 1;
                if emitted >= config.student_constraint_limit {
                    break 'students;
                }
            }
        }
    }
    debug!("H2: {} student non-collision constraints emitted", emitted);
}

/// H3 -- room slot exclusivity, bounded to a fixed neighbourhood of following
/// modules in a fixed order. For each compared pair, at least one of
/// "same room", "same day", "same slot" must be false; each "same X" bit is
/// reified with a one-directional implication (X-equal implies bit = 1), which
/// is all soundness requires: the solver is never forced to set a bit when
/// the underlying values differ, so `sum(bits) <= 2` genuinely forbids the
/// all-three-equal assignment.
fn add_room_slot_exclusivity_constraints(
    model: &mut CpModelBuilder,
    vars: &[ModuleVars],
    config: &SchedulerConfig,
) {
    let n = vars.len();
    let mut emitted = 0usize;
    for i in 0..n {
        let end = (i + 1 + config.pair_neighbourhood).min(n);
        for j in (i + 1)..end {
            let room_eq = reify_equal(model, &vars[i].room, &vars[j].room);
            let day_eq = reify_equal(model, &vars[i].day, &vars[j].day);
            let slot_eq = reify_equal(model, &vars[i].slot, &vars[j].slot);
            model.add_le(
                LinearExpr::from(room_eq) + LinearExpr::from(day_eq) + LinearExpr::from(slot_eq),
                LinearExpr::from(2),
            );
            emitted += 1;
        }
    }
    debug!("H3: {} room-slot exclusivity constraints emitted", emitted);
}

/// Returns a bool forced to 1 whenever `a == b` (the converse is not
/// enforced, which is fine for the uses above: see module doc).
fn reify_equal(model: &mut CpModelBuilder, a: &IntVar, b: &IntVar) -> BoolVar {
    let lit = model.new_bool_var();
    model.add_ne(LinearExpr::from(a.clone()), LinearExpr::from(b.clone()))
        .only_enforce_if(lit.not());
    lit
}

/// H4 (optional promotion) -- for every day and proctor, bound the number of
/// modules assigned to that (day, proctor) pair by the proctor's per-day cap.
/// "Assigned to (d, p)" is linearised as the AND of two one-directional
/// equality indicators (`add_le`/`add_ge` over sums, no disjunction
/// primitive needed).
fn add_proctor_day_cap_constraints(
    model: &mut CpModelBuilder,
    input: &InputModel,
    vars: &[ModuleVars],
    nb_days: i32,
) {
    for (p_idx, proctor) in input.proctors.iter().enumerate() {
        for d in 0..nb_days {
            let mut indicators = Vec::with_capacity(vars.len());
            for mv in vars {
                let is_day = reify_equal_to_const(model, &mv.day, d as i64);
                let is_proctor = reify_equal_to_const(model, &mv.proctor, p_idx as i64);
                let both = model.new_bool_var();
                model.add_le(LinearExpr::from(both.clone()), LinearExpr::from(is_day.clone()));
                model.add_le(LinearExpr::from(both.clone()), LinearExpr::from(is_proctor.clone()));
                model.add_ge(
                    LinearExpr::from(both.clone()),
                    LinearExpr::from(is_day) + LinearExpr::from(is_proctor) - LinearExpr::from(1),
                );
                indicators.push((1i64, both));
            }
            let sum: LinearExpr = indicators.into_iter().collect();
            model.add_le(sum, LinearExpr::from(proctor.max_surveillance_per_day as i64));
        }
    }
}

fn reify_equal_to_const(model: &mut CpModelBuilder, v: &IntVar, c: i64) -> BoolVar {
    let lit = model.new_bool_var();
    model.add_ne(LinearExpr::from(v.clone()), LinearExpr::from(c))
        .only_enforce_if(lit.not());
    lit
}

/// O1 (compactness, prefer earlier days) + O2 (amphi bias for large
/// cohorts), combined into a single maximised expression.
fn build_objective(model: &mut CpModelBuilder, input: &InputModel, vars: &[ModuleVars]) -> LinearExpr {
    let mut objective = LinearExpr::from(0);

    for mv in vars {
        objective = objective - LinearExpr::from(mv.day.clone());
    }

    let mut amphi_terms: Vec<(i64, BoolVar)> = Vec::new();
    for (m, mv) in vars.iter().enumerate() {
        if input.size_of[m] <= 50 {
            continue;
        }
        for r in 0..mv.room_capacity_count {
            if input.rooms[r].room_type != RoomType::Amphi {
                continue;
            }
            let bonus = model.new_bool_var();
            model
                .add_eq(LinearExpr::from(mv.room.clone()), LinearExpr::from(r as i64))
                .only_enforce_if(bonus.clone());
            amphi_terms.push((2, bonus));
        }
    }
    let amphi_expr: LinearExpr = amphi_terms.into_iter().collect();
    objective + amphi_expr
}
