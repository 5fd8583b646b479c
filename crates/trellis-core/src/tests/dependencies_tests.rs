use super::*;
use crate::applier::{Primitive, RootPrimitive};
use crate::context::BuildContext;
use crate::widget::{PrimitiveWidget, Widget, WidgetBase};

struct Leaf;

impl WidgetBase for Leaf {}

impl PrimitiveWidget for Leaf {
    fn create_primitive(&self, _ctx: &BuildContext<'_>) -> Box<dyn Primitive> {
        Box::new(RootPrimitive::default())
    }
}

fn element() -> Element {
    Element::new(Widget::primitive(Leaf))
}

fn ids(elements: &[Element]) -> Vec<ElementId> {
    elements.iter().map(Element::id).collect()
}

#[test]
fn subscribers_are_listed_in_subscription_order() {
    let mut graph = DependencyGraph::default();
    let producer = element();
    let (a, b) = (element(), element());
    graph.add(&b, &producer);
    graph.add(&a, &producer);
    graph.add(&b, &producer);

    assert_eq!(ids(&graph.subscribers_of(producer.id())), vec![b.id(), a.id()]);
}

#[test]
fn detach_stops_notifications_but_remembers_dependencies() {
    let mut graph = DependencyGraph::default();
    let producer = element();
    let subscriber = element();
    graph.add(&subscriber, &producer);

    graph.detach(subscriber.id());
    assert!(graph.subscribers_of(producer.id()).is_empty());
    assert!(graph.clear(subscriber.id()));
    assert!(!graph.clear(subscriber.id()));
}

#[test]
fn removing_producer_updates_subscriber_index() {
    let mut graph = DependencyGraph::default();
    let producer = element();
    let subscriber = element();
    graph.add(&subscriber, &producer);

    graph.remove_producer(producer.id());
    assert!(graph.subscribers_of(producer.id()).is_empty());
    assert!(!graph.clear(subscriber.id()));
}

#[test]
fn dropped_subscribers_are_skipped() {
    let mut graph = DependencyGraph::default();
    let producer = element();
    let kept = element();
    graph.add(&kept, &producer);
    {
        let dropped = element();
        graph.add(&dropped, &producer);
    }
    assert_eq!(ids(&graph.subscribers_of(producer.id())), vec![kept.id()]);
}
