//! Free-surface area distribution.
//!
//! The node continuity equation needs to know how much free-surface area
//! each conduit contributes to its end nodes. The split depends on the
//! flow regime: a subcritical conduit hands half of each end's trapezoid
//! to the adjacent node, a critical or dry end contributes nothing and
//! pushes its half to the other node, and a fully dry conduit leaves a
//! sliver so the node equations stay regular.
//!
//! Distribution may also revise an end depth and head: a critical end is
//! pinned to the smaller of critical and normal depth, and a dry end to
//! the depth floor.

use crate::constants::FUDGE;
use crate::dynwave::classify::{classify, FlowClass};
use crate::network::{Link, Node};
use crate::xsect::Xsect;

/// Top width used for surface-area purposes.
///
/// Closed sections lose their free surface at the crown; widths above
/// 96% of full depth are evaluated at that depth instead so the area
/// contribution never vanishes while the conduit is still nominally
/// open-surface.
fn get_width(xsect: &Xsect, y: f64) -> f64 {
    let y = if y / xsect.y_full > 0.96 && !xsect.is_open() {
        0.96 * xsect.y_full
    } else {
        y
    };
    xsect.w_of_y(y)
}

/// Classify the conduit and distribute its surface area to the end nodes.
///
/// Writes `flow_class`, `surf_area1` and `surf_area2` on the link and
/// returns the possibly revised `(h1, h2, y1, y2)`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn find_surf_area(
    link: &mut Link,
    nodes: &[Node],
    gravity: f64,
    q: f64,
    length: f64,
    h1: f64,
    h2: f64,
    y1: f64,
    y2: f64,
) -> (f64, f64, f64, f64) {
    let mut depth1 = y1;
    let mut depth2 = y2;
    let mut head1 = h1;
    let mut head2 = h2;
    let mut surf_area1 = 0.0;
    let mut surf_area2 = 0.0;

    let cls = classify(link, nodes, q, h1, h2, y1, y2, gravity);
    link.flow_class = cls.class;

    match cls.class {
        FlowClass::Subcritical => {
            let depth_mid = (0.5 * (depth1 + depth2)).max(FUDGE);
            let width1 = get_width(&link.xsect, depth1);
            let width2 = get_width(&link.xsect, depth2);
            let width_mid = get_width(&link.xsect, depth_mid);
            surf_area1 = (width1 + width_mid) * length / 4.0;
            surf_area2 = (width_mid + width2) * length / 4.0 * cls.fasnh;
        }

        FlowClass::UpCritical => {
            depth1 = if cls.y_norm < cls.y_crit {
                cls.y_norm
            } else {
                cls.y_crit
            };
            depth1 = depth1.max(FUDGE);
            head1 = nodes[link.node1].invert_elev + link.offset1 + depth1;
            let depth_mid = (0.5 * (depth1 + depth2)).max(FUDGE);
            let width2 = get_width(&link.xsect, depth2);
            let width_mid = get_width(&link.xsect, depth_mid);
            surf_area2 = (width_mid + width2) * length * 0.5;
        }

        FlowClass::DownCritical => {
            depth2 = if cls.y_norm < cls.y_crit {
                cls.y_norm
            } else {
                cls.y_crit
            };
            depth2 = depth2.max(FUDGE);
            head2 = nodes[link.node2].invert_elev + link.offset2 + depth2;
            let width1 = get_width(&link.xsect, depth1);
            let depth_mid = (0.5 * (depth1 + depth2)).max(FUDGE);
            let width_mid = get_width(&link.xsect, depth_mid);
            surf_area1 = (width1 + width_mid) * length * 0.5;
        }

        FlowClass::UpDry => {
            depth1 = FUDGE;
            let depth_mid = (0.5 * (depth1 + depth2)).max(FUDGE);
            let width1 = get_width(&link.xsect, depth1);
            let width2 = get_width(&link.xsect, depth2);
            let width_mid = get_width(&link.xsect, depth_mid);

            // Downstream half always drains to the downstream node.
            surf_area2 = (width_mid + width2) * length / 4.0;

            // Without a free fall at the upstream end the upstream half
            // still belongs to the upstream node.
            if link.offset1 <= 0.0 {
                surf_area1 = (width1 + width_mid) * length / 4.0;
            }
        }

        FlowClass::DownDry => {
            depth2 = FUDGE;
            let depth_mid = (0.5 * (depth1 + depth2)).max(FUDGE);
            let width1 = get_width(&link.xsect, depth1);
            let width2 = get_width(&link.xsect, depth2);
            let width_mid = get_width(&link.xsect, depth_mid);

            surf_area1 = (width_mid + width1) * length / 4.0;

            if link.offset2 <= 0.0 {
                surf_area2 = (width2 + width_mid) * length / 4.0;
            }
        }

        FlowClass::Dry => {
            surf_area1 = FUDGE * length / 2.0;
            surf_area2 = surf_area1;
        }

        // The classifier never produces this; promotion to supercritical
        // happens later from the Froude number.
        FlowClass::Supercritical => {}
    }

    link.surf_area1 = surf_area1;
    link.surf_area2 = surf_area2;
    (head1, head2, depth1, depth2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::GRAVITY;
    use crate::network::Conduit;
    use crate::types::NodeIndex;

    fn nodes(depth1: f64, depth2: f64) -> Vec<Node> {
        let mut n1 = Node::junction(10.0);
        n1.new_depth = depth1;
        let mut n2 = Node::junction(9.0);
        n2.new_depth = depth2;
        vec![n1, n2]
    }

    fn pipe() -> Link {
        Link::new(
            NodeIndex::new(0),
            NodeIndex::new(1),
            Xsect::circular(1.0),
            Conduit::new(100.0, 0.013, 0.01),
        )
    }

    #[test]
    fn test_crown_width_correction() {
        let xs = Xsect::circular(1.0);
        // Raw width collapses at the crown; the corrected one does not.
        assert!(xs.w_of_y(1.0) < 1e-6);
        let w = get_width(&xs, 1.0);
        assert!((w - xs.w_of_y(0.96)).abs() < 1e-12);
        assert!(w > 0.3);
        // Open channels are left alone.
        let open = Xsect::rect_open(4.0, 1.0);
        assert_eq!(get_width(&open, 1.0), 4.0);
    }

    #[test]
    fn test_subcritical_split() {
        let nodes = nodes(0.5, 0.4);
        let mut link = pipe();
        let length = 100.0;
        let (h1, h2, y1, y2) =
            find_surf_area(&mut link, &nodes, GRAVITY, 1.0, length, 10.5, 9.4, 0.5, 0.4);
        assert_eq!(link.flow_class, FlowClass::Subcritical);
        // Depths and heads untouched.
        assert_eq!((h1, h2, y1, y2), (10.5, 9.4, 0.5, 0.4));

        let xs = Xsect::circular(1.0);
        let w1 = xs.w_of_y(0.5);
        let w2 = xs.w_of_y(0.4);
        let wm = xs.w_of_y(0.45);
        assert!((link.surf_area1 - (w1 + wm) * length / 4.0).abs() < 1e-9);
        assert!((link.surf_area2 - (wm + w2) * length / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_down_critical_pins_depth_and_head() {
        let nodes = nodes(0.8, 0.01);
        let mut link = pipe().with_offsets(0.0, 2.0);
        let (_h1, h2, _y1, y2) =
            find_surf_area(&mut link, &nodes, GRAVITY, 1.0, 100.0, 10.8, 11.01, 0.8, 0.01);
        assert_eq!(link.flow_class, FlowClass::DownCritical);
        // Downstream depth pinned to min(yN, yC) and head rebuilt from it.
        assert!(y2 > 0.01);
        assert!((h2 - (9.0 + 2.0 + y2)).abs() < 1e-12);
        // All surface area goes upstream.
        assert_eq!(link.surf_area2, 0.0);
        assert!(link.surf_area1 > 0.0);
    }

    #[test]
    fn test_dry_conduit_leaves_sliver() {
        let nodes = nodes(0.0, 0.0);
        let mut link = pipe();
        find_surf_area(&mut link, &nodes, GRAVITY, 0.0, 100.0, 10.0, 9.0, 0.0, 0.0);
        assert_eq!(link.flow_class, FlowClass::Dry);
        assert!((link.surf_area1 - FUDGE * 100.0 / 2.0).abs() < 1e-15);
        assert_eq!(link.surf_area1, link.surf_area2);
    }

    #[test]
    fn test_up_dry_free_fall_starves_upstream_node() {
        let nodes = nodes(0.0, 0.3);
        // With an upstream drop, the upstream node gets no surface area.
        let mut link = pipe().with_offsets(1.0, 0.0);
        find_surf_area(&mut link, &nodes, GRAVITY, 0.5, 100.0, 11.0, 9.3, 0.0, 0.3);
        assert_eq!(link.flow_class, FlowClass::UpDry);
        assert_eq!(link.surf_area1, 0.0);
        assert!(link.surf_area2 > 0.0);

        // Without the drop, the upstream half stays with the node.
        let mut link = pipe();
        let (_, _, y1, _) =
            find_surf_area(&mut link, &nodes, GRAVITY, 0.5, 100.0, 10.0, 9.3, 0.0, 0.3);
        assert_eq!(link.flow_class, FlowClass::UpDry);
        assert_eq!(y1, FUDGE);
        assert!(link.surf_area1 > 0.0);
    }
}
