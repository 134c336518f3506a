use std::collections::{BTreeMap, BTreeSet};

use crate::{Agent, Obstacle, Rect, RenderSurface};

/// Identity of an object in a [`Scene`].
///
/// Ids are allocated in increasing order and never reused, so ordering by id
/// is insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
#[display("#{_0}")]
pub struct ObjectId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, derive_more::IsVariant)]
pub enum ObjectKind {
    #[display("agent")]
    Agent,
    #[display("obstacle")]
    Obstacle,
}

/// Anything that lives in the scene and takes part in the frame lifecycle.
#[derive(Debug, derive_more::From, derive_more::IsVariant)]
pub enum SimObject {
    Agent(Agent),
    Obstacle(Obstacle),
}

impl SimObject {
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        match self {
            SimObject::Agent(_) => ObjectKind::Agent,
            SimObject::Obstacle(_) => ObjectKind::Obstacle,
        }
    }

    #[must_use]
    pub fn bounds(&self) -> Rect {
        match self {
            SimObject::Agent(agent) => agent.bounds(),
            SimObject::Obstacle(obstacle) => obstacle.bounds(),
        }
    }

    #[must_use]
    pub fn as_agent(&self) -> Option<&Agent> {
        match self {
            SimObject::Agent(agent) => Some(agent),
            SimObject::Obstacle(_) => None,
        }
    }

    pub fn as_agent_mut(&mut self) -> Option<&mut Agent> {
        match self {
            SimObject::Agent(agent) => Some(agent),
            SimObject::Obstacle(_) => None,
        }
    }

    #[must_use]
    pub fn as_obstacle(&self) -> Option<&Obstacle> {
        match self {
            SimObject::Obstacle(obstacle) => Some(obstacle),
            SimObject::Agent(_) => None,
        }
    }

    #[must_use]
    pub fn into_agent(self) -> Option<Agent> {
        match self {
            SimObject::Agent(agent) => Some(agent),
            SimObject::Obstacle(_) => None,
        }
    }

    pub fn draw(&self, surface: &mut dyn RenderSurface) {
        match self {
            SimObject::Agent(agent) => agent.draw(surface),
            SimObject::Obstacle(obstacle) => obstacle.draw(surface),
        }
    }
}

/// Registry of live objects.
///
/// Iteration follows insertion order. Lifecycle dispatch walks a snapshot of
/// [`ids`](Self::ids), so objects removed mid-walk are skipped and objects
/// added mid-walk wait for the next frame.
///
/// Obstacles are also indexed on their own, so obstacle queries cost the same
/// however many agents are alive.
#[derive(Debug, Default)]
pub struct Scene {
    objects: BTreeMap<ObjectId, SimObject>,
    obstacle_ids: BTreeSet<ObjectId>,
    next_id: u64,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object and returns its freshly allocated id.
    pub fn insert(&mut self, object: impl Into<SimObject>) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.put(id, object.into());
        id
    }

    /// Puts back an object previously taken out with [`remove`](Self::remove).
    pub fn restore(&mut self, id: ObjectId, object: SimObject) {
        debug_assert!(id.0 < self.next_id);
        self.put(id, object);
    }

    fn put(&mut self, id: ObjectId, object: SimObject) {
        if object.is_obstacle() {
            self.obstacle_ids.insert(id);
        }
        self.objects.insert(id, object);
    }

    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&SimObject> {
        self.objects.get(&id)
    }

    /// Mutable access to an object. Replacing it with one of another kind is
    /// not supported.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SimObject> {
        self.objects.get_mut(&id)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<SimObject> {
        self.obstacle_ids.remove(&id);
        self.objects.remove(&id)
    }

    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Snapshot of the live ids in insertion order.
    #[must_use]
    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SimObject)> + '_ {
        self.objects.iter().map(|(id, object)| (*id, object))
    }

    pub fn agents(&self) -> impl Iterator<Item = (ObjectId, &Agent)> + '_ {
        self.iter()
            .filter_map(|(id, object)| object.as_agent().map(|agent| (id, agent)))
    }

    pub fn agents_mut(&mut self) -> impl Iterator<Item = (ObjectId, &mut Agent)> + '_ {
        self.objects
            .iter_mut()
            .filter_map(|(id, object)| object.as_agent_mut().map(|agent| (*id, agent)))
    }

    pub fn obstacles(&self) -> impl Iterator<Item = (ObjectId, &Obstacle)> + '_ {
        self.obstacle_ids.iter().filter_map(|id| {
            let obstacle = self.objects.get(id)?.as_obstacle()?;
            Some((*id, obstacle))
        })
    }

    pub fn obstacles_mut(&mut self) -> impl Iterator<Item = (ObjectId, &mut Obstacle)> + '_ {
        self.objects.iter_mut().filter_map(|(id, object)| match object {
            SimObject::Obstacle(obstacle) => Some((*id, obstacle)),
            SimObject::Agent(_) => None,
        })
    }

    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agents().count()
    }

    #[must_use]
    pub fn obstacle_count(&self) -> usize {
        self.obstacle_ids.len()
    }

    /// The nearest obstacle strictly ahead of `x`. Ties go to the older one.
    #[must_use]
    pub fn upcoming_obstacle(&self, x: f32) -> Option<&Obstacle> {
        nearest(self.obstacles().map(|(_, o)| o).filter(|o| o.x() > x))
    }

    /// The nearest obstacle whose right edge has not yet passed `x`.
    #[must_use]
    pub fn blocking_obstacle(&self, x: f32) -> Option<&Obstacle> {
        nearest(self.obstacles().map(|(_, o)| o).filter(|o| o.right() >= x))
    }

    /// Removes every object, oldest first.
    pub fn drain(&mut self) -> Vec<(ObjectId, SimObject)> {
        self.obstacle_ids.clear();
        std::mem::take(&mut self.objects).into_iter().collect()
    }

    pub fn draw(&self, surface: &mut dyn RenderSurface) {
        for object in self.objects.values() {
            object.draw(surface);
        }
    }
}

fn nearest<'a>(obstacles: impl Iterator<Item = &'a Obstacle>) -> Option<&'a Obstacle> {
    let mut best: Option<&Obstacle> = None;
    for obstacle in obstacles {
        if best.is_none_or(|b| obstacle.x() < b.x()) {
            best = Some(obstacle);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Controller, CourseConfig};

    fn obstacle(x: f32) -> Obstacle {
        Obstacle::with_gap_top(x, 100.0, &CourseConfig::default())
    }

    #[test]
    fn test_ids_follow_insertion_order() {
        let config = CourseConfig::default();
        let mut scene = Scene::new();
        let a = scene.insert(obstacle(500.0));
        let b = scene.insert(Agent::new(&config, Controller::manual()));
        let c = scene.insert(obstacle(200.0));
        assert_eq!(scene.ids(), vec![a, b, c]);

        let taken = scene.remove(b).unwrap();
        assert!(!scene.contains(b));
        scene.restore(b, taken);
        assert_eq!(scene.ids(), vec![a, b, c]);
        assert_eq!(scene.agent_count(), 1);
        assert_eq!(scene.obstacle_count(), 2);
    }

    #[test]
    fn test_removed_ids_are_not_reused() {
        let mut scene = Scene::new();
        let a = scene.insert(obstacle(500.0));
        scene.remove(a);
        let b = scene.insert(obstacle(500.0));
        assert!(b > a);
    }

    #[test]
    fn test_upcoming_and_blocking_obstacles() {
        let mut scene = Scene::new();
        scene.insert(obstacle(600.0));
        scene.insert(obstacle(50.0));
        scene.insert(obstacle(300.0));

        // 50..110 still overlaps x = 100 but is not ahead of it.
        assert_eq!(scene.upcoming_obstacle(100.0).unwrap().x(), 300.0);
        assert_eq!(scene.blocking_obstacle(100.0).unwrap().x(), 50.0);
        assert_eq!(scene.blocking_obstacle(200.0).unwrap().x(), 300.0);
        assert!(scene.upcoming_obstacle(700.0).is_none());
    }

    #[test]
    fn test_obstacle_queries_ignore_agents() {
        let config = CourseConfig::default();
        let mut scene = Scene::new();
        for _ in 0..100 {
            scene.insert(Agent::new(&config, Controller::manual()));
        }
        let near = scene.insert(obstacle(300.0));
        scene.insert(obstacle(600.0));
        assert_eq!(scene.agent_count(), 100);
        assert_eq!(scene.obstacle_count(), 2);

        let taken = scene.remove(near).unwrap();
        assert_eq!(scene.obstacle_count(), 1);
        assert_eq!(scene.upcoming_obstacle(100.0).unwrap().x(), 600.0);

        scene.restore(near, taken);
        assert_eq!(scene.upcoming_obstacle(100.0).unwrap().x(), 300.0);
        let ids: Vec<_> = scene.obstacles().map(|(id, _)| id).collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], near);

        scene.drain();
        assert_eq!(scene.obstacle_count(), 0);
        assert!(scene.upcoming_obstacle(0.0).is_none());
    }

    #[test]
    fn test_drain_empties_scene_in_order() {
        let mut scene = Scene::new();
        let a = scene.insert(obstacle(1.0));
        let b = scene.insert(obstacle(2.0));
        let drained: Vec<_> = scene.drain().into_iter().map(|(id, _)| id).collect();
        assert_eq!(drained, vec![a, b]);
        assert!(scene.is_empty());
    }
}
