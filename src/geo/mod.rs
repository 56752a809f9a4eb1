use crate::models::driver::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

#[cfg(test)]
mod tests {
    use super::haversine_km;
    use crate::models::driver::GeoPoint;

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint {
            lat: 37.5665,
            lng: 126.9780,
        };
        assert!(haversine_km(&p, &p) < 1e-9);
    }

    #[test]
    fn seoul_to_busan_is_around_325_km() {
        let seoul = GeoPoint {
            lat: 37.5665,
            lng: 126.9780,
        };
        let busan = GeoPoint {
            lat: 35.1796,
            lng: 129.0756,
        };
        let distance = haversine_km(&seoul, &busan);
        assert!((distance - 325.0).abs() < 10.0, "got {distance}");
    }
}
