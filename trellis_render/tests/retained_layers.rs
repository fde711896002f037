// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layers recorded by [`RecordingOwner`] stay live inside display lists
//! recorded earlier, and state changes touch only the work that read them.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kurbo::{Point, Rect, Size};
use trellis_core::canvas::Color;
use trellis_core::constraints::Constraints;
use trellis_core::layer::LayerConfig;
use trellis_core::observe::{ReadScope, StateCell};
use trellis_core::tree::{
    DrawScope, ElementId, Fixed, LayoutTree, MeasurePolicy, MeasureResult, MeasureScope, Modifier,
    Placement,
};
use trellis_render::{DisplayList, FlatFill, OwnerLog, RecordingOwner};

const VIEW: Constraints = Constraints::tight(Size::new(100.0, 100.0));

fn tree() -> (LayoutTree, Rc<RefCell<OwnerLog>>) {
    let owner = RecordingOwner::new();
    let log = owner.log();
    (LayoutTree::new(Box::new(owner)), log)
}

/// Places every child at `at`, optionally on a layer.
fn placing_at(at: Rc<Cell<Point>>, layer: Option<LayerConfig>) -> impl MeasurePolicy {
    move |scope: &mut MeasureScope<'_>, children: &[ElementId], c: Constraints| {
        let placements = children
            .iter()
            .map(|&child| {
                scope.measure(child, Constraints::loose(c.max));
                let placement = Placement::new(child, at.get());
                match &layer {
                    Some(config) => placement.with_layer(config.clone()),
                    None => placement,
                }
            })
            .collect();
        MeasureResult::new(c.max, placements)
    }
}

fn fill_from(color: StateCell<Color>) -> Modifier {
    Modifier::draw(move |scope: &mut DrawScope<'_>| {
        let color = scope.read(&color);
        let bounds = scope.bounds();
        scope.canvas().fill_rect(bounds, color);
    })
}

/// A root with one 5×5 child at `(10, 20)` filled from `color`.
fn scene(
    tree: &mut LayoutTree,
    color: &StateCell<Color>,
    at: Rc<Cell<Point>>,
    layer: Option<LayerConfig>,
) -> ElementId {
    let root = tree.create_element(placing_at(at, layer));
    let child = tree.create_element(Fixed(Size::new(5.0, 5.0)));
    tree.set_modifiers(child, vec![fill_from(color.clone())])
        .unwrap();
    tree.insert_child(root, child).unwrap();
    tree.set_root(root).unwrap();
    tree.layout_root(VIEW).unwrap();
    child
}

#[test]
fn repainting_a_layer_reaches_a_recorded_frame() {
    let (mut tree, log) = tree();
    let color = tree.state(Color::RED);
    let at = Rc::new(Cell::new(Point::new(10.0, 20.0)));
    let child = scene(&mut tree, &color, at, Some(LayerConfig::new(|_| {})));
    let layer = tree.outer_wrapper(child);

    let mut frame = DisplayList::new();
    tree.draw_root(&mut frame);
    assert_eq!(
        frame.flatten(),
        [FlatFill {
            rect: Rect::new(10.0, 20.0, 15.0, 25.0),
            color: Color::RED,
            alpha: 1.0,
        }]
    );

    let root_invalidations = log.borrow().root_invalidations;
    color.set(Color::BLACK);
    let applied = tree.apply_state_changes();
    assert_eq!(applied.repaints, [layer]);
    assert!(applied.parameters.is_empty());
    assert!(!applied.root);
    assert_eq!(log.borrow().root_invalidations, root_invalidations);

    tree.update_layers();
    assert_eq!(frame.flatten()[0].color, Color::BLACK);
    let log = log.borrow();
    let entry = log.layer_of(layer).unwrap();
    assert_eq!(entry.stats.borrow().paints, 2);
}

#[test]
fn paint_outside_layers_invalidates_the_root() {
    let (mut tree, log) = tree();
    let color = tree.state(Color::RED);
    let at = Rc::new(Cell::new(Point::new(10.0, 20.0)));
    scene(&mut tree, &color, at, None);

    let mut frame = DisplayList::new();
    tree.draw_root(&mut frame);
    let root_invalidations = log.borrow().root_invalidations;

    color.set(Color::BLACK);
    let applied = tree.apply_state_changes();
    assert!(applied.root);
    assert!(applied.repaints.is_empty());
    assert_eq!(log.borrow().root_invalidations, root_invalidations + 1);

    frame.clear();
    tree.draw_root(&mut frame);
    assert_eq!(frame.flatten()[0].color, Color::BLACK);
    assert!(log.borrow().layers.is_empty());
}

#[test]
fn moving_a_layer_keeps_its_content() {
    let (mut tree, log) = tree();
    let color = tree.state(Color::RED);
    let at = Rc::new(Cell::new(Point::new(10.0, 20.0)));
    let child = scene(
        &mut tree,
        &color,
        Rc::clone(&at),
        Some(LayerConfig::new(|_| {})),
    );
    let layer = tree.outer_wrapper(child);
    let mut frame = DisplayList::new();
    tree.draw_root(&mut frame);
    let root_invalidations = log.borrow().root_invalidations;
    let moves = log.borrow().layer_of(layer).unwrap().stats.borrow().moves;

    at.set(Point::new(40.0, 0.0));
    tree.layout_root(VIEW).unwrap();
    tree.update_layers();

    assert_eq!(frame.flatten()[0].rect, Rect::new(40.0, 0.0, 45.0, 5.0));
    let log = log.borrow();
    let stats = log.layer_of(layer).unwrap().stats.borrow().clone();
    assert_eq!(stats.moves, moves + 1);
    assert_eq!(stats.paints, 1);
    assert_eq!(log.root_invalidations, root_invalidations);
    assert_eq!(log.layout_changes.last(), Some(&child));
}

#[test]
fn config_reads_update_parameters_without_repainting() {
    let (mut tree, log) = tree();
    let color = tree.state(Color::RED);
    let alpha = tree.state(1.0_f64);
    let read_alpha = alpha.clone();
    let config = LayerConfig::new(move |scope| {
        scope.alpha = scope.read(&read_alpha);
    });
    let at = Rc::new(Cell::new(Point::new(10.0, 20.0)));
    let child = scene(&mut tree, &color, at, Some(config));
    let layer = tree.outer_wrapper(child);
    let mut frame = DisplayList::new();
    tree.draw_root(&mut frame);

    alpha.set(0.5);
    let applied = tree.apply_state_changes();
    assert_eq!(applied.parameters, [layer]);
    assert!(applied.repaints.is_empty());
    tree.update_layers();

    assert_eq!(frame.flatten()[0].alpha, 0.5);
    let log = log.borrow();
    let stats = log.layer_of(layer).unwrap().stats.borrow().clone();
    assert_eq!(stats.parameter_updates, 2);
    assert_eq!(stats.paints, 1);
    assert_eq!(stats.invalidations, 0);
}

#[test]
fn clipping_layer_bounds_its_content() {
    let (mut tree, _log) = tree();
    let root = tree.create_element(placing_at(
        Rc::new(Cell::new(Point::new(10.0, 20.0))),
        None,
    ));
    let child = tree.create_element(Fixed(Size::new(5.0, 5.0)));
    tree.set_modifiers(
        child,
        vec![
            Modifier::layer(|scope| scope.clip = true),
            Modifier::draw(|scope: &mut DrawScope<'_>| {
                let spill = scope.bounds().inflate(10.0, 10.0);
                scope.canvas().fill_rect(spill, Color::RED);
            }),
        ],
    )
    .unwrap();
    tree.insert_child(root, child).unwrap();
    tree.set_root(root).unwrap();
    tree.layout_root(VIEW).unwrap();

    let mut frame = DisplayList::new();
    tree.draw_root(&mut frame);
    assert_eq!(frame.flatten()[0].rect, Rect::new(10.0, 20.0, 15.0, 25.0));
}

#[test]
fn nested_layers_repaint_independently() {
    let (mut tree, log) = tree();
    let inner_color = tree.state(Color::RED);
    let root = tree.create_element(Fixed(Size::new(100.0, 100.0)));
    let outer = tree.create_element(placing_at(
        Rc::new(Cell::new(Point::new(5.0, 5.0))),
        None,
    ));
    let paints = Rc::new(Cell::new(0));
    let counter = Rc::clone(&paints);
    tree.set_modifiers(
        outer,
        vec![
            Modifier::layer(|_| {}),
            Modifier::draw(move |scope: &mut DrawScope<'_>| {
                counter.set(counter.get() + 1);
                scope.draw_content();
            }),
        ],
    )
    .unwrap();
    let leaf = tree.create_element(Fixed(Size::new(5.0, 5.0)));
    tree.set_modifiers(
        leaf,
        vec![Modifier::layer(|_| {}), fill_from(inner_color.clone())],
    )
    .unwrap();
    tree.insert_child(root, outer).unwrap();
    tree.insert_child(outer, leaf).unwrap();
    tree.set_root(root).unwrap();
    tree.layout_root(VIEW).unwrap();

    let mut frame = DisplayList::new();
    tree.draw_root(&mut frame);
    assert_eq!(paints.get(), 1);
    assert_eq!(frame.flatten()[0].rect, Rect::new(5.0, 5.0, 10.0, 10.0));

    inner_color.set(Color::BLACK);
    tree.apply_state_changes();
    tree.update_layers();
    assert_eq!(paints.get(), 1, "the outer layer keeps its content");
    assert_eq!(frame.flatten()[0].color, Color::BLACK);
    assert_eq!(log.borrow().live_layers(), 2);
}

#[test]
fn restacking_moved_layers_repaints_their_parent() {
    let (mut tree, log) = tree();
    let red = tree.state(Color::RED);
    let black = tree.state(Color::BLACK);
    let first_at = Rc::new(Cell::new((Point::ORIGIN, 0.0)));
    let root = tree.create_element(Fixed(Size::new(100.0, 100.0)));
    let placement = Rc::clone(&first_at);
    let parent = tree.create_element(
        move |scope: &mut MeasureScope<'_>, children: &[ElementId], c: Constraints| {
            let placements = children
                .iter()
                .enumerate()
                .map(|(i, &child)| {
                    scope.measure(child, Constraints::loose(c.max));
                    let (at, z) = if i == 0 {
                        placement.get()
                    } else {
                        (Point::ORIGIN, 1.0)
                    };
                    Placement::new(child, at)
                        .with_z_index(z)
                        .with_layer(LayerConfig::new(|_| {}))
                })
                .collect();
            MeasureResult::new(c.max, placements)
        },
    );
    tree.set_modifiers(parent, vec![Modifier::layer(|_| {})])
        .unwrap();
    let first = tree.create_element(Fixed(Size::new(5.0, 5.0)));
    let second = tree.create_element(Fixed(Size::new(5.0, 5.0)));
    tree.set_modifiers(first, vec![fill_from(red)]).unwrap();
    tree.set_modifiers(second, vec![fill_from(black)]).unwrap();
    tree.insert_child(root, parent).unwrap();
    tree.insert_child(parent, first).unwrap();
    tree.insert_child(parent, second).unwrap();
    tree.set_root(root).unwrap();
    tree.layout_root(VIEW).unwrap();

    let mut frame = DisplayList::new();
    tree.draw_root(&mut frame);
    let colors: Vec<_> = frame.flatten().iter().map(|f| f.color).collect();
    assert_eq!(colors, [Color::RED, Color::BLACK]);

    first_at.set((Point::new(1.0, 0.0), 2.0));
    tree.layout_root(VIEW).unwrap();
    tree.update_layers();

    let fills = frame.flatten();
    let colors: Vec<_> = fills.iter().map(|f| f.color).collect();
    assert_eq!(colors, [Color::BLACK, Color::RED]);
    assert_eq!(fills[1].rect, Rect::new(1.0, 0.0, 6.0, 5.0));
    let log = log.borrow();
    let parent_layer = log.layer_of(tree.inner_wrapper(parent)).unwrap();
    assert_eq!(parent_layer.stats.borrow().paints, 2);
}
