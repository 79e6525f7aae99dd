//! The single page map dashboard served at `/`.
//!
//! Leaflet and the CartoDB tiles are loaded from their CDNs, everything else is
//! inline. The page only talks to `GET /active-fires`.

pub const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Firewatch - Active Fires</title>
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"
          integrity="sha256-p4NxAoJBhIIN+hmNHrzRCf9tD/miZyoHS5obTRR9BMY=" crossorigin="">
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"
            integrity="sha256-20nQCchB9co0qIjJZRGuk2/Z9VM+kNiyxNV1lvTlZBo=" crossorigin=""></script>
    <style>
        * { box-sizing: border-box; }
        body {
            margin: 0;
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
            background: #1a1a1a;
            color: #eee;
            display: flex;
            height: 100vh;
        }
        #sidebar {
            width: 300px;
            padding: 16px;
            background: #242424;
            overflow-y: auto;
        }
        #sidebar h1 { font-size: 20px; margin: 0 0 4px; color: #ff7a1a; }
        #sidebar p.sub { margin: 0 0 16px; font-size: 12px; color: #999; }
        label { display: block; font-size: 13px; margin: 12px 0 4px; }
        input[type=text], input[type=number] {
            width: 100%;
            padding: 6px 8px;
            border: 1px solid #444;
            border-radius: 4px;
            background: #111;
            color: #eee;
        }
        .check { display: flex; align-items: center; gap: 6px; margin: 4px 0; font-size: 13px; }
        .check input { margin: 0; }
        button {
            margin-top: 16px;
            width: 100%;
            padding: 8px;
            border: none;
            border-radius: 4px;
            background: #ff7a1a;
            color: #111;
            font-weight: bold;
            cursor: pointer;
        }
        button:disabled { background: #666; cursor: wait; }
        #status { margin-top: 16px; font-size: 13px; min-height: 20px; }
        #status.error { color: #ff6b6b; }
        #status.empty { color: #f0c040; }
        #legend { margin-top: 16px; font-size: 12px; }
        #legend div { display: flex; align-items: center; gap: 6px; margin: 2px 0; }
        #legend span.swatch { width: 12px; height: 12px; border-radius: 50%; display: inline-block; }
        #map { flex: 1; }
        footer { margin-top: 24px; font-size: 11px; color: #777; }
        footer a { color: #999; }
    </style>
</head>
<body>
    <div id="sidebar">
        <h1>Firewatch</h1>
        <p class="sub">Active fire detections per country</p>

        <form id="query">
            <label for="country">Country (name or ISO code)</label>
            <input type="text" id="country" name="country" list="countries" value="Vietnam" required>
            <datalist id="countries">
                <option value="AR"><option value="AU"><option value="BO"><option value="BR">
                <option value="CA"><option value="CD"><option value="CL"><option value="CN">
                <option value="CO"><option value="ES"><option value="GR"><option value="ID">
                <option value="IN"><option value="KH"><option value="LA"><option value="MM">
                <option value="MX"><option value="PE"><option value="PT"><option value="RU">
                <option value="TH"><option value="TR"><option value="US"><option value="VN">
                <option value="ZA"><option value="ZM">
            </datalist>

            <label for="days">Day range (1-10)</label>
            <input type="number" id="days" name="days" min="1" max="10" value="9">

            <label>Sources</label>
            <div class="check"><input type="checkbox" name="source" value="MODIS_NRT" id="src-modis" checked><label for="src-modis">MODIS NRT</label></div>
            <div class="check"><input type="checkbox" name="source" value="VIIRS_NOAA20_NRT" id="src-noaa20" checked><label for="src-noaa20">VIIRS NOAA-20 NRT</label></div>
            <div class="check"><input type="checkbox" name="source" value="VIIRS_SNPP_NRT" id="src-snpp" checked><label for="src-snpp">VIIRS S-NPP NRT</label></div>
            <div class="check"><input type="checkbox" name="source" value="VIIRS_NOAA21_NRT" id="src-noaa21"><label for="src-noaa21">VIIRS NOAA-21 NRT</label></div>

            <div class="check" style="margin-top: 12px;">
                <input type="checkbox" id="include_low" name="include_low">
                <label for="include_low">Include low confidence detections</label>
            </div>

            <button type="submit" id="submit">Show fires</button>
        </form>

        <div id="status"></div>
        <div id="legend"></div>

        <footer>
            Fire data: <a href="https://firms.modaps.eosdis.nasa.gov" target="_blank">NASA FIRMS</a><br>
            Boundaries: <a href="https://nominatim.openstreetmap.org" target="_blank">OpenStreetMap Nominatim</a>
        </footer>
    </div>
    <div id="map"></div>

    <script>
        const PALETTE = ["darkred", "red", "darkorange", "orange", "orange", "beige", "beige", "lightgray", "lightgray", "gray"];
        const BOUNDARY_STYLE = { fillColor: "#228B22", color: "orange", weight: 1, fillOpacity: 0.5 };

        const map = L.map("map").setView([16.0, 106.0], 5);
        const tiles = L.tileLayer("https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png", {
            attribution: '&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors &copy; <a href="https://carto.com/attributions">CARTO</a>',
            subdomains: "abcd",
            maxZoom: 19
        }).addTo(map);

        let boundaryLayer = null;
        let firesLayer = null;
        let layerControl = null;

        function colorFor(daysAgo) {
            return PALETTE[Math.min(daysAgo, PALETTE.length - 1)];
        }

        function daysAgoLabel(daysAgo) {
            if (daysAgo === 0) return "today";
            if (daysAgo === 1) return "1 day ago";
            return daysAgo + " days ago";
        }

        function setStatus(text, kind) {
            const status = document.getElementById("status");
            status.textContent = text;
            status.className = kind || "";
        }

        function renderLegend() {
            const legend = document.getElementById("legend");
            legend.innerHTML = "";
            PALETTE.forEach((color, index) => {
                if (index > 0 && PALETTE[index - 1] === color) return;
                const row = document.createElement("div");
                const swatch = document.createElement("span");
                swatch.className = "swatch";
                swatch.style.background = color;
                row.appendChild(swatch);
                row.appendChild(document.createTextNode(index === PALETTE.length - 1 ? daysAgoLabel(index) + " or older" : daysAgoLabel(index)));
                legend.appendChild(row);
            });
        }

        // upstream text goes in as text nodes, never as markup
        function tooltipContent(lines) {
            const content = document.createElement("div");
            lines.forEach((line, index) => {
                if (index > 0) content.appendChild(document.createElement("br"));
                content.appendChild(document.createTextNode(String(line)));
            });
            return content;
        }

        function clearLayers() {
            if (boundaryLayer) map.removeLayer(boundaryLayer);
            if (firesLayer) map.removeLayer(firesLayer);
            if (layerControl) map.removeControl(layerControl);
            boundaryLayer = firesLayer = layerControl = null;
        }

        function render(data) {
            clearLayers();

            boundaryLayer = L.geoJSON(data.boundary, { style: BOUNDARY_STYLE })
                .bindTooltip(tooltipContent(["Country: " + data.country.display_name]));

            firesLayer = L.layerGroup(data.fires.map(fire =>
                L.circleMarker([fire.lat, fire.lon], {
                    radius: 4,
                    color: colorFor(fire.days_ago),
                    fillColor: colorFor(fire.days_ago),
                    fillOpacity: 0.9,
                    weight: 1
                }).bindTooltip(tooltipContent([
                    "Detected: " + fire.timestamp.replace("T", " ").replace("Z", " UTC"),
                    "Confidence: " + fire.confidence + " (" + fire.confidence_level + ")",
                    "Days ago: " + fire.days_ago,
                    "Source: " + fire.source
                ]))
            ));

            boundaryLayer.addTo(map);
            firesLayer.addTo(map);
            layerControl = L.control.layers(
                { "CartoDB Positron": tiles },
                { "Country boundary": boundaryLayer, "Active fires": firesLayer }
            ).addTo(map);

            map.setView(data.country.center, 5);
            const bounds = boundaryLayer.getBounds();
            if (bounds.isValid()) map.fitBounds(bounds);

            if (data.fires.length === 0) {
                setStatus("No fires found in " + data.country.name + " over the last " + data.days + " day(s).", "empty");
            } else {
                setStatus(data.fires.length + " fire(s) found in " + data.country.name + ".");
            }
        }

        async function query(event) {
            if (event) event.preventDefault();
            const params = new URLSearchParams();
            params.set("country", document.getElementById("country").value.trim());
            params.set("days", document.getElementById("days").value);
            const sources = Array.from(document.querySelectorAll("input[name=source]:checked")).map(el => el.value);
            params.set("sources", sources.join(","));
            params.set("include_low", document.getElementById("include_low").checked ? "true" : "false");

            const button = document.getElementById("submit");
            button.disabled = true;
            setStatus("Loading...");
            try {
                const response = await fetch("/active-fires?" + params.toString());
                const data = await response.json();
                if (!response.ok) {
                    clearLayers();
                    const message = data && data.error ? data.error.message : response.statusText;
                    setStatus("Error: " + message, "error");
                    return;
                }
                render(data);
            } catch (err) {
                setStatus("Error: " + err.message, "error");
            } finally {
                button.disabled = false;
            }
        }

        renderLegend();
        document.getElementById("query").addEventListener("submit", query);
    </script>
</body>
</html>
"##;
