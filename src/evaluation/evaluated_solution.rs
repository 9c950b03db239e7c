use crate::domain::problem::Problem;
use crate::error::{Error, InvariantViolation, Result};
use crate::evaluation::cost::Cost;
use crate::utils::compare_floats;

#[derive(Debug, Clone, Default, PartialEq)]
struct CustomerRecord {
    cluster: Option<usize>,
    // Sum over the other members m of cost_per_unit_travel(m) * travel(self, m).
    travel_sum: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct ClusterRecord {
    centre: Option<usize>,
    quantity: f64,
    cost: Cost,
    members: Vec<usize>,
}

/// Scalar state captured before a what-if evaluation.
#[derive(Debug, Default)]
struct Snapshot {
    cost: Cost,
    clusters: Vec<(usize, Option<usize>, f64, Cost)>,
    travel_sums: Vec<(usize, f64)>,
}

/// Membership edit made by one reassignment; `from` keeps the vacated slot.
#[derive(Debug, Clone, Copy)]
struct MembershipChange {
    customer: usize,
    from: Option<(usize, usize)>,
    to: Option<usize>,
}

/// Assignment of customers (locations) to clusters with incrementally
/// maintained per-cluster quantity, centre and cost.
///
/// Customers and clusters live in flat arenas indexed by their dense ids.
/// The only mutating primitive is [`EvaluatedSolution::set_customer_to_cluster`],
/// which touches the two affected clusters in time linear in their size.
#[derive(Debug, Clone)]
pub struct EvaluatedSolution<'a> {
    problem: &'a Problem,
    customers: Vec<CustomerRecord>,
    clusters: Vec<ClusterRecord>,
    cost: Cost,
    all_centres_immutable: bool,
}

impl<'a> EvaluatedSolution<'a> {
    /// Seeds a solution with one optional centre per cluster. Each centre is
    /// assigned to its own cluster, everything else starts unassigned.
    pub fn new(problem: &'a Problem, centres: &[Option<usize>]) -> Result<Self> {
        if centres.len() != problem.cluster_count() {
            return Err(Error::CentreCountMismatch {
                expected: problem.cluster_count(),
                found: centres.len(),
            });
        }

        let mut solution = Self {
            problem,
            customers: vec![CustomerRecord::default(); problem.location_count()],
            clusters: vec![ClusterRecord::default(); problem.cluster_count()],
            cost: Cost::zero(),
            all_centres_immutable: false,
        };

        for (cluster, centre) in centres.iter().enumerate() {
            let fixed = problem.fixed_location(cluster);
            match *centre {
                Some(customer) if customer >= problem.location_count() => {
                    return Err(Error::UnknownCentre { cluster, customer });
                }
                Some(customer) => {
                    let claimed_elsewhere = problem
                        .fixed_cluster(customer)
                        .is_some_and(|owner| owner != cluster);
                    if fixed.is_some_and(|location| location != customer) || claimed_elsewhere {
                        return Err(Error::FixedCentreMismatch { cluster });
                    }
                    if solution.customers[customer].cluster.is_some() {
                        return Err(Error::CustomerAlreadyAssigned(customer));
                    }
                    solution.insert(customer, cluster);
                }
                None if fixed.is_some() => return Err(Error::FixedCentreMismatch { cluster }),
                None => {}
            }
        }

        Ok(solution)
    }

    pub fn problem(&self) -> &'a Problem {
        self.problem
    }

    /// Total cost, the sum of every cluster's cost.
    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn cluster_of(&self, customer: usize) -> Option<usize> {
        self.customers[customer].cluster
    }

    pub fn centre(&self, cluster: usize) -> Option<usize> {
        self.clusters[cluster].centre
    }

    pub fn centres(&self) -> Vec<Option<usize>> {
        self.clusters.iter().map(|c| c.centre).collect()
    }

    pub fn members(&self, cluster: usize) -> &[usize] {
        &self.clusters[cluster].members
    }

    pub fn cluster_cost(&self, cluster: usize) -> Cost {
        self.clusters[cluster].cost
    }

    pub fn cluster_quantity(&self, cluster: usize) -> f64 {
        self.clusters[cluster].quantity
    }

    pub fn travel_sum(&self, customer: usize) -> f64 {
        self.customers[customer].travel_sum
    }

    pub fn unassigned(&self) -> impl Iterator<Item = usize> + '_ {
        self.customers
            .iter()
            .enumerate()
            .filter(|(_, record)| record.cluster.is_none())
            .map(|(customer, _)| customer)
    }

    /// While set, every current centre is treated as pinned. Releasing leaves
    /// non-centre travel sums stale until the next [`EvaluatedSolution::update`].
    pub fn set_all_centres_immutable(&mut self, immutable: bool) {
        self.all_centres_immutable = immutable;
    }

    pub fn all_centres_immutable(&self) -> bool {
        self.all_centres_immutable
    }

    /// True when the customer is the centre of its cluster and that centre cannot move.
    pub fn is_pinned_centre(&self, customer: usize) -> bool {
        match self.customers[customer].cluster {
            Some(cluster) => {
                self.clusters[cluster].centre == Some(customer) && self.is_pinned(cluster)
            }
            None => false,
        }
    }

    fn is_pinned(&self, cluster: usize) -> bool {
        self.all_centres_immutable || self.problem.fixed_location(cluster).is_some()
    }

    /// Moves the customer to `target` (`None` unassigns it).
    pub fn set_customer_to_cluster(
        &mut self,
        customer: usize,
        target: Option<usize>,
    ) -> Result<()> {
        self.apply(customer, target).map(|_| ())
    }

    /// Cost delta of moving the customer to `target`, leaving the solution untouched.
    pub fn evaluate_set(&mut self, customer: usize, target: Option<usize>) -> Result<Cost> {
        let from = self.customers[customer].cluster;
        if from == target {
            return Ok(Cost::zero());
        }

        let touched: Vec<usize> = from.into_iter().chain(target).collect();
        let snapshot = self.snapshot(&touched, &[customer]);
        let change = self.apply(customer, target)?;
        let delta = self.cost - snapshot.cost;
        self.restore(snapshot, change.iter().copied());
        Ok(delta)
    }

    /// Cost delta of exchanging the clusters of two assigned customers,
    /// leaving the solution untouched.
    pub fn evaluate_swap(&mut self, first: usize, second: usize) -> Result<Cost> {
        let first_cluster = self.customers[first]
            .cluster
            .ok_or(InvariantViolation::UnassignedCustomer(first))?;
        let second_cluster = self.customers[second]
            .cluster
            .ok_or(InvariantViolation::UnassignedCustomer(second))?;
        if first_cluster == second_cluster {
            return Ok(Cost::zero());
        }

        let snapshot = self.snapshot(&[first_cluster, second_cluster], &[first, second]);
        let first_change = self.apply(first, Some(second_cluster))?;
        let second_change = match self.apply(second, Some(first_cluster)) {
            Ok(change) => change,
            Err(err) => {
                self.restore(snapshot, first_change.iter().copied());
                return Err(err);
            }
        };
        let delta = self.cost - snapshot.cost;
        self.restore(snapshot, first_change.into_iter().chain(second_change));
        Ok(delta)
    }

    /// Recomputes every cluster's quantity, centre and cost from scratch,
    /// discarding round-off accumulated by incremental updates.
    pub fn update(&mut self) -> Result<()> {
        let problem = self.problem;
        self.cost = Cost::zero();

        for cluster in 0..self.clusters.len() {
            let members = std::mem::take(&mut self.clusters[cluster].members);
            for &member in &members {
                self.customers[member].travel_sum = 0.0;
            }

            let pinned_centre = match problem.fixed_location(cluster) {
                Some(fixed) => Some(fixed),
                None if self.all_centres_immutable => self.clusters[cluster].centre,
                None => None,
            };

            let centre = if members.is_empty() {
                None
            } else if let Some(centre) = pinned_centre {
                if !members.contains(&centre) {
                    self.clusters[cluster].members = members;
                    return Err(InvariantViolation::InconsistentCluster {
                        cluster,
                        reason: "pinned centre is not a member",
                    }
                    .into());
                }
                self.customers[centre].travel_sum = travel_sum_from(problem, centre, &members);
                Some(centre)
            } else {
                for &member in &members {
                    self.customers[member].travel_sum = travel_sum_from(problem, member, &members);
                }
                self.medoid(&members)
            };

            let quantity: f64 = members.iter().map(|&m| problem.quantity(m)).sum();
            let cost = Cost::new(
                centre.map_or(0.0, |c| self.customers[c].travel_sum),
                (quantity - problem.capacity(cluster)).max(0.0),
            );
            let record = &mut self.clusters[cluster];
            record.members = members;
            record.centre = centre;
            record.quantity = quantity;
            record.cost = cost;
            self.cost += cost;
        }

        self.check_consistency()
    }

    /// Verifies that clusters have a centre exactly when they have members
    /// and that membership is mirrored on both sides.
    pub fn check_consistency(&self) -> Result<()> {
        for (cluster, record) in self.clusters.iter().enumerate() {
            let reason = match record.centre {
                None if !record.members.is_empty() => Some("members without a centre"),
                Some(_) if record.members.is_empty() => Some("centre without members"),
                Some(centre) if self.customers[centre].cluster != Some(cluster) => {
                    Some("centre is not a member")
                }
                _ => record
                    .members
                    .iter()
                    .any(|&m| self.customers[m].cluster != Some(cluster))
                    .then_some("member assigned elsewhere"),
            };
            if let Some(reason) = reason {
                return Err(InvariantViolation::InconsistentCluster { cluster, reason }.into());
            }
        }
        Ok(())
    }

    fn apply(
        &mut self,
        customer: usize,
        target: Option<usize>,
    ) -> Result<Option<MembershipChange>> {
        let from = self.customers[customer].cluster;
        if from == target {
            return Ok(None);
        }

        let vacated = match from {
            Some(cluster) => {
                if self.is_pinned_centre(customer) {
                    return Err(InvariantViolation::PinnedCentreMoved { customer, cluster }.into());
                }
                Some((cluster, self.remove(customer, cluster)?))
            }
            None => None,
        };
        if let Some(cluster) = target {
            self.insert(customer, cluster);
        }

        Ok(Some(MembershipChange {
            customer,
            from: vacated,
            to: target,
        }))
    }

    fn insert(&mut self, customer: usize, cluster: usize) {
        let problem = self.problem;
        let pinned = self.is_pinned(cluster);
        let weight = problem.cost_per_unit_travel(customer);
        self.customers[customer].cluster = Some(cluster);
        self.clusters[cluster].quantity += problem.quantity(customer);

        match self.clusters[cluster].centre {
            // only the centre's distances count while it cannot move
            Some(centre) if pinned => {
                self.customers[centre].travel_sum += weight * problem.travel(centre, customer);
                self.customers[customer].travel_sum = 0.0;
                self.clusters[cluster].members.push(customer);
            }
            _ => {
                let mut own = 0.0;
                for &member in &self.clusters[cluster].members {
                    self.customers[member].travel_sum += weight * problem.travel(member, customer);
                    own += problem.cost_per_unit_travel(member) * problem.travel(customer, member);
                }
                self.customers[customer].travel_sum = own;
                self.clusters[cluster].members.push(customer);
                self.recentre(cluster);
            }
        }

        self.refresh_cost(cluster);
    }

    fn remove(&mut self, customer: usize, cluster: usize) -> Result<usize> {
        let problem = self.problem;
        let position = self.clusters[cluster]
            .members
            .iter()
            .position(|&m| m == customer)
            .ok_or(InvariantViolation::CustomerNotInCluster { customer, cluster })?;
        let pinned = self.is_pinned(cluster);
        let weight = problem.cost_per_unit_travel(customer);

        self.clusters[cluster].members.swap_remove(position);
        self.clusters[cluster].quantity -= problem.quantity(customer);
        self.customers[customer].cluster = None;
        self.customers[customer].travel_sum = 0.0;

        match self.clusters[cluster].centre {
            Some(centre) if pinned && centre != customer => {
                self.customers[centre].travel_sum -= weight * problem.travel(centre, customer);
            }
            _ => {
                for &member in &self.clusters[cluster].members {
                    self.customers[member].travel_sum -= weight * problem.travel(member, customer);
                }
                self.recentre(cluster);
            }
        }

        match self.clusters[cluster].members.len() {
            0 => self.clusters[cluster].quantity = 0.0,
            1 => {
                let only = self.clusters[cluster].members[0];
                self.customers[only].travel_sum = 0.0;
            }
            _ => {}
        }

        self.refresh_cost(cluster);
        Ok(position)
    }

    fn recentre(&mut self, cluster: usize) {
        let record = &self.clusters[cluster];
        let centre = if record.members.is_empty() {
            None
        } else if let Some(fixed) = self.problem.fixed_location(cluster) {
            Some(fixed)
        } else if self.all_centres_immutable && record.centre.is_some() {
            record.centre
        } else {
            self.medoid(&record.members)
        };
        self.clusters[cluster].centre = centre;
    }

    fn medoid(&self, members: &[usize]) -> Option<usize> {
        members.iter().copied().min_by(|&a, &b| {
            compare_floats(self.customers[a].travel_sum, self.customers[b].travel_sum)
                .then(a.cmp(&b))
        })
    }

    fn refresh_cost(&mut self, cluster: usize) {
        let record = &self.clusters[cluster];
        let updated = Cost::new(
            record.centre.map_or(0.0, |c| self.customers[c].travel_sum),
            (record.quantity - self.problem.capacity(cluster)).max(0.0),
        );
        self.cost -= record.cost;
        self.cost += updated;
        self.clusters[cluster].cost = updated;
    }

    fn snapshot(&self, clusters: &[usize], customers: &[usize]) -> Snapshot {
        let mut snapshot = Snapshot {
            cost: self.cost,
            ..Snapshot::default()
        };
        for &cluster in clusters {
            let record = &self.clusters[cluster];
            snapshot
                .clusters
                .push((cluster, record.centre, record.quantity, record.cost));
            let saved: &[usize] = match record.centre {
                Some(ref centre) if self.is_pinned(cluster) => std::slice::from_ref(centre),
                _ => &record.members,
            };
            snapshot
                .travel_sums
                .extend(saved.iter().map(|&c| (c, self.customers[c].travel_sum)));
        }
        snapshot
            .travel_sums
            .extend(customers.iter().map(|&c| (c, self.customers[c].travel_sum)));
        snapshot
    }

    fn restore(
        &mut self,
        snapshot: Snapshot,
        changes: impl DoubleEndedIterator<Item = MembershipChange>,
    ) {
        for change in changes.rev() {
            if let Some(to) = change.to {
                self.clusters[to].members.pop();
            }
            match change.from {
                Some((from, position)) => {
                    let members = &mut self.clusters[from].members;
                    members.push(change.customer);
                    let last = members.len() - 1;
                    members.swap(position, last);
                    self.customers[change.customer].cluster = Some(from);
                }
                None => self.customers[change.customer].cluster = None,
            }
        }
        for (cluster, centre, quantity, cost) in snapshot.clusters {
            let record = &mut self.clusters[cluster];
            record.centre = centre;
            record.quantity = quantity;
            record.cost = cost;
        }
        for (customer, travel_sum) in snapshot.travel_sums {
            self.customers[customer].travel_sum = travel_sum;
        }
        self.cost = snapshot.cost;
    }
}

fn travel_sum_from(problem: &Problem, from: usize, members: &[usize]) -> f64 {
    members
        .iter()
        .filter(|&&m| m != from)
        .map(|&m| problem.cost_per_unit_travel(m) * problem.travel(from, m))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Cluster, Location, TravelEdge};

    /// Locations on a line at the given positions, travel is the absolute distance.
    fn line_problem(positions: &[f64], clusters: Vec<Cluster>) -> Problem {
        let locations = positions
            .iter()
            .enumerate()
            .map(|(i, _)| Location::new(format!("l{i}"), 1.0));
        let mut edges = Vec::new();
        for (i, a) in positions.iter().enumerate() {
            for (j, b) in positions.iter().enumerate() {
                edges.push(TravelEdge::new(format!("l{i}"), format!("l{j}"), (a - b).abs()));
            }
        }
        Problem::new(locations, clusters, edges).unwrap()
    }

    fn two_clusters(capacity: f64) -> Vec<Cluster> {
        vec![Cluster::new("a", capacity), Cluster::new("b", capacity)]
    }

    fn assert_same_state(left: &EvaluatedSolution, right: &EvaluatedSolution) {
        assert_eq!(left.customers, right.customers);
        assert_eq!(left.clusters, right.clusters);
        assert_eq!(left.cost, right.cost);
    }

    #[test]
    fn seeds_centres_into_their_clusters() {
        let problem = line_problem(&[0.0, 1.0, 5.0, 6.0], two_clusters(10.0));
        let solution = EvaluatedSolution::new(&problem, &[Some(0), Some(3)]).unwrap();

        assert_eq!(solution.cluster_of(0), Some(0));
        assert_eq!(solution.cluster_of(3), Some(1));
        assert_eq!(solution.unassigned().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(solution.cost(), Cost::zero());
        assert_eq!(solution.centres(), vec![Some(0), Some(3)]);
        solution.check_consistency().unwrap();
    }

    #[test]
    fn rejects_malformed_centres() {
        let problem = line_problem(&[0.0, 1.0, 2.0], two_clusters(10.0));
        assert_eq!(
            EvaluatedSolution::new(&problem, &[Some(0)]).unwrap_err(),
            Error::CentreCountMismatch { expected: 2, found: 1 }
        );
        assert_eq!(
            EvaluatedSolution::new(&problem, &[Some(1), Some(1)]).unwrap_err(),
            Error::CustomerAlreadyAssigned(1)
        );
        let unknown = EvaluatedSolution::new(&problem, &[Some(0), Some(999)]).unwrap_err();
        assert_eq!(unknown, Error::UnknownCentre { cluster: 1, customer: 999 });
        assert!(unknown.is_construction());

        let fixed = line_problem(
            &[0.0, 1.0, 2.0],
            vec![Cluster::new("a", 10.0).fixed_to("l2"), Cluster::new("b", 10.0)],
        );
        assert_eq!(
            EvaluatedSolution::new(&fixed, &[Some(0), None]).unwrap_err(),
            Error::FixedCentreMismatch { cluster: 0 }
        );
        assert_eq!(
            EvaluatedSolution::new(&fixed, &[None, Some(0)]).unwrap_err(),
            Error::FixedCentreMismatch { cluster: 0 }
        );
        assert_eq!(
            EvaluatedSolution::new(&fixed, &[Some(2), Some(2)]).unwrap_err(),
            Error::FixedCentreMismatch { cluster: 1 }
        );
    }

    #[test]
    fn detects_cluster_without_centre() {
        let problem = line_problem(&[0.0, 1.0, 2.0], two_clusters(10.0));
        let mut solution = EvaluatedSolution::new(&problem, &[Some(0), Some(1)]).unwrap();
        solution.set_customer_to_cluster(2, Some(0)).unwrap();
        solution.clusters[0].centre = None;

        assert_eq!(
            solution.check_consistency().unwrap_err(),
            Error::Invariant(InvariantViolation::InconsistentCluster {
                cluster: 0,
                reason: "members without a centre",
            })
        );
    }

    #[test]
    fn detects_member_not_marked_as_assigned() {
        let problem = line_problem(&[0.0, 1.0, 2.0], two_clusters(10.0));
        let mut solution = EvaluatedSolution::new(&problem, &[Some(0), Some(1)]).unwrap();
        solution.clusters[1].members.push(2);

        assert_eq!(
            solution.check_consistency().unwrap_err(),
            Error::Invariant(InvariantViolation::InconsistentCluster {
                cluster: 1,
                reason: "member assigned elsewhere",
            })
        );
        assert!(matches!(
            solution.update(),
            Err(Error::Invariant(InvariantViolation::InconsistentCluster { cluster: 1, .. }))
        ));
    }

    #[test]
    fn update_rejects_fixed_centre_missing_from_members() {
        let problem = line_problem(
            &[0.0, 1.0, 2.0],
            vec![Cluster::new("a", 10.0).fixed_to("l0"), Cluster::new("b", 10.0)],
        );
        let mut solution = EvaluatedSolution::new(&problem, &[Some(0), Some(1)]).unwrap();
        solution.set_customer_to_cluster(2, Some(0)).unwrap();
        solution.clusters[0].members.retain(|&m| m != 0);

        assert_eq!(
            solution.update().unwrap_err(),
            Error::Invariant(InvariantViolation::InconsistentCluster {
                cluster: 0,
                reason: "pinned centre is not a member",
            })
        );
    }

    #[test]
    fn moving_customer_missing_from_its_cluster_fails() {
        let problem = line_problem(&[0.0, 1.0, 2.0], two_clusters(10.0));
        let mut solution = EvaluatedSolution::new(&problem, &[Some(0), Some(1)]).unwrap();
        solution.set_customer_to_cluster(2, Some(0)).unwrap();
        solution.customers[2].cluster = Some(1);

        assert_eq!(
            solution.set_customer_to_cluster(2, Some(0)).unwrap_err(),
            Error::Invariant(InvariantViolation::CustomerNotInCluster {
                customer: 2,
                cluster: 1,
            })
        );
    }

    #[test]
    fn centre_moves_to_medoid() {
        let problem = line_problem(&[0.0, 5.0, 6.0, 7.0, 20.0], vec![Cluster::new("a", 10.0)]);
        let mut solution = EvaluatedSolution::new(&problem, &[Some(0)]).unwrap();
        for customer in 1..5 {
            solution.set_customer_to_cluster(customer, Some(0)).unwrap();
        }

        assert_eq!(solution.centre(0), Some(2));
        // 6 + 1 + 1 + 14
        assert_eq!(solution.cost(), Cost::new(22.0, 0.0));
        assert_eq!(solution.cluster_quantity(0), 5.0);
    }

    #[test]
    fn incremental_cost_matches_full_recompute() {
        let problem = line_problem(&[0.0, 1.5, 2.0, 7.0, 8.5, 9.0, 3.3], two_clusters(3.0));
        let mut solution = EvaluatedSolution::new(&problem, &[Some(0), Some(5)]).unwrap();
        let moves = [
            (1, Some(0)),
            (2, Some(0)),
            (3, Some(1)),
            (4, Some(1)),
            (6, Some(0)),
            (2, Some(1)),
            (1, None),
            (4, Some(0)),
        ];
        for (customer, target) in moves {
            solution.set_customer_to_cluster(customer, target).unwrap();
            let incremental = solution.cost();
            let mut recomputed = solution.clone();
            recomputed.update().unwrap();
            assert!(incremental.is_approx_equal(&recomputed.cost()));
            for cluster in 0..2 {
                let violation = (solution.cluster_quantity(cluster) - 3.0).max(0.0);
                assert_eq!(solution.cluster_cost(cluster).capacity_violation, violation);
            }
        }
    }

    #[test]
    fn capacity_violation_tracks_quantity() {
        let problem = line_problem(&[0.0, 1.0, 2.0], vec![Cluster::new("a", 1.5)]);
        let mut solution = EvaluatedSolution::new(&problem, &[Some(0)]).unwrap();
        solution.set_customer_to_cluster(1, Some(0)).unwrap();
        assert_eq!(solution.cost().capacity_violation, 0.5);
        solution.set_customer_to_cluster(2, Some(0)).unwrap();
        assert_eq!(solution.cost().capacity_violation, 1.5);
        solution.set_customer_to_cluster(2, None).unwrap();
        assert_eq!(solution.cost().capacity_violation, 0.5);
    }

    #[test]
    fn evaluate_set_reports_delta_without_mutating() {
        let problem = line_problem(&[0.0, 1.0, 2.0, 10.0, 11.0], two_clusters(10.0));
        let mut solution = EvaluatedSolution::new(&problem, &[Some(1), Some(3)]).unwrap();
        solution.set_customer_to_cluster(0, Some(0)).unwrap();
        solution.set_customer_to_cluster(2, Some(0)).unwrap();
        solution.set_customer_to_cluster(4, Some(1)).unwrap();

        let before = solution.clone();
        let delta = solution.evaluate_set(2, Some(1)).unwrap();
        assert_same_state(&before, &solution);

        let mut moved = solution.clone();
        moved.set_customer_to_cluster(2, Some(1)).unwrap();
        assert_eq!(delta, moved.cost() - before.cost());

        let unassign = solution.evaluate_set(4, None).unwrap();
        assert_same_state(&before, &solution);
        assert_eq!(unassign, Cost::new(-1.0, 0.0));
        assert_eq!(solution.evaluate_set(4, Some(1)).unwrap(), Cost::zero());
    }

    #[test]
    fn evaluate_swap_reports_delta_without_mutating() {
        let problem = line_problem(&[0.0, 1.0, 9.0, 10.0, 11.0, 2.0], two_clusters(10.0));
        let mut solution = EvaluatedSolution::new(&problem, &[Some(0), Some(3)]).unwrap();
        solution.set_customer_to_cluster(1, Some(0)).unwrap();
        solution.set_customer_to_cluster(2, Some(0)).unwrap();
        solution.set_customer_to_cluster(4, Some(1)).unwrap();
        solution.set_customer_to_cluster(5, Some(1)).unwrap();

        let before = solution.clone();
        let delta = solution.evaluate_swap(2, 5).unwrap();
        assert_same_state(&before, &solution);
        assert!(delta < Cost::zero());

        let mut swapped = solution.clone();
        swapped.set_customer_to_cluster(2, Some(1)).unwrap();
        swapped.set_customer_to_cluster(5, Some(0)).unwrap();
        assert_eq!(delta, swapped.cost() - before.cost());

        assert_eq!(solution.evaluate_swap(0, 1).unwrap(), Cost::zero());
    }

    #[test]
    fn evaluate_swap_rejects_unassigned_customer() {
        let problem = line_problem(&[0.0, 1.0, 2.0], two_clusters(10.0));
        let mut solution = EvaluatedSolution::new(&problem, &[Some(0), Some(1)]).unwrap();
        assert_eq!(
            solution.evaluate_swap(0, 2).unwrap_err(),
            Error::Invariant(InvariantViolation::UnassignedCustomer(2))
        );
    }

    #[test]
    fn fixed_centre_never_moves() {
        let problem = line_problem(
            &[0.0, 5.0, 6.0, 7.0],
            vec![Cluster::new("a", 10.0).fixed_to("l0"), Cluster::new("b", 10.0)],
        );
        let mut solution = EvaluatedSolution::new(&problem, &[Some(0), Some(3)]).unwrap();
        solution.set_customer_to_cluster(1, Some(0)).unwrap();
        solution.set_customer_to_cluster(2, Some(0)).unwrap();
        assert_eq!(solution.centre(0), Some(0));
        assert_eq!(solution.cost().travel, 11.0);
        assert!(solution.is_pinned_centre(0));
        assert!(!solution.is_pinned_centre(3));

        let err = solution.set_customer_to_cluster(0, Some(1)).unwrap_err();
        assert_eq!(
            err,
            Error::Invariant(InvariantViolation::PinnedCentreMoved {
                customer: 0,
                cluster: 0
            })
        );
        assert!(!err.is_construction());
        assert!(solution.evaluate_set(0, None).is_err());

        solution.update().unwrap();
        assert_eq!(solution.centre(0), Some(0));
        assert_eq!(solution.cost().travel, 11.0);
    }

    #[test]
    fn immutable_centres_hold_until_released() {
        let problem = line_problem(&[0.0, 5.0, 6.0, 7.0], vec![Cluster::new("a", 10.0)]);
        let mut solution = EvaluatedSolution::new(&problem, &[Some(0)]).unwrap();
        solution.set_all_centres_immutable(true);
        for customer in 1..4 {
            solution.set_customer_to_cluster(customer, Some(0)).unwrap();
        }
        assert_eq!(solution.centre(0), Some(0));
        assert_eq!(solution.cost().travel, 18.0);
        assert!(solution.set_customer_to_cluster(0, None).is_err());

        solution.set_all_centres_immutable(false);
        solution.update().unwrap();
        // l1 and l2 tie on 8, the lower index wins
        assert_eq!(solution.centre(0), Some(1));
        assert_eq!(solution.cost().travel, 8.0);
    }

    #[test]
    fn emptied_cluster_loses_its_centre() {
        let problem = line_problem(&[0.0, 1.0], two_clusters(10.0));
        let mut solution = EvaluatedSolution::new(&problem, &[Some(0), Some(1)]).unwrap();
        solution.set_customer_to_cluster(1, Some(0)).unwrap();
        assert_eq!(solution.centre(1), None);
        assert_eq!(solution.cluster_cost(1), Cost::zero());
        assert_eq!(solution.members(0).len(), 2);
        solution.check_consistency().unwrap();
    }

    #[test]
    fn weighted_travel_uses_member_multiplier() {
        let problem = Problem::new(
            vec![
                Location::new("x", 1.0),
                Location::new("y", 1.0).with_cost_per_unit_travel(10.0),
            ],
            vec![Cluster::new("a", 10.0)],
            vec![TravelEdge::new("x", "y", 2.0), TravelEdge::new("y", "x", 3.0)],
        )
        .unwrap();
        let mut solution = EvaluatedSolution::new(&problem, &[Some(0)]).unwrap();
        solution.set_customer_to_cluster(1, Some(0)).unwrap();
        // centred on y: 1 * 3 beats centred on x: 10 * 2
        assert_eq!(solution.centre(0), Some(1));
        assert_eq!(solution.cost().travel, 3.0);
    }
}
